//! Post-processing for neural armor / object detectors.
//!
//! This crate owns what happens *after* a forward pass:
//! - decoding a flat `[num_anchors, 5 + num_classes]` tensor into
//!   [`RawDetection`]s,
//! - greedy confidence-first non-maximum suppression,
//! - the cached-engine policy around an external inference backend.
//!
//! It does **not** run inference. The accelerator runtime is reached only
//! through the [`InferenceEngine`] and [`EngineBackend`] traits.

mod decode;
mod detection;
mod detector;
mod engine;
mod nms;

pub use decode::{decode, TensorShape};
pub use detection::{iou, RawDetection};
pub use detector::{preprocess, NeuralDetector, NeuralDetectorParams};
pub use engine::{
    engine_path_for, load_or_build_engine, EngineBackend, EngineError, InferenceEngine,
    InputShape,
};
pub use nms::non_max_suppression;
