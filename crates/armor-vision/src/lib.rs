//! High-level facade crate for the `armor-vision-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates under short module names
//! - JSON parameter documents for the detectors ([`DetectConfig`])
//! - a one-shot runner from an `image::RgbImage` to a serializable
//!   [`DetectionReport`]
//!
//! ## Quickstart
//!
//! ```no_run
//! use armor_vision::{run_detection, DetectConfig, DetectorKind, Overlay};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut img = image::open("frame.png")?.to_rgb8();
//! let config = DetectConfig::default_for(DetectorKind::Snipe);
//! let report = run_detection(&config, &mut img, Overlay::default());
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `armor_vision::core`: light bars, armors, frames, draw primitives, logging.
//! - `armor_vision::nn`: tensor decoding, NMS and the neural detector.
//! - `armor_vision::predict`: Kalman filters and the armor tracker.
//! - `armor_vision::detect`: classical detectors and overlay rendering.

pub use armor_vision_core as core;
pub use armor_vision_detect as detect;
pub use armor_vision_nn as nn;
pub use armor_vision_predict as predict;

pub use armor_vision_core::{Armor, LightBar, Model, Team};
pub use armor_vision_detect::Detector;

pub mod io;
mod run;

pub use io::{DetectConfig, DetectorKind, DetectorParams, ParamsIoError};
pub use run::{run_detection, DetectionReport, Overlay, Targets};
