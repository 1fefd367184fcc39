//! Seams towards the accelerator runtime.
//!
//! Nothing here executes a network. A backend knows how to compile a model
//! into an engine, serialize it and load it back; an engine knows its I/O
//! shapes and runs one blocking forward pass.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::decode::TensorShape;

/// Extension of the serialized engine cached next to the model file.
const ENGINE_EXTENSION: &str = "engine";

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("model artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },
    #[error("failed to build engine from {}: {reason}", path.display())]
    Build { path: PathBuf, reason: String },
    #[error("failed to serialize engine: {0}")]
    Serialize(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("frame is {actual:?}, engine expects {expected:?}")]
    ShapeMismatch {
        expected: InputShape,
        actual: InputShape,
    },
    #[error("engine output row length {row_len} cannot hold a box and a class score")]
    InvalidOutputShape { row_len: usize },
    #[error("inference failed: {0}")]
    Inference(String),
}

/// Network input in HWC order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl InputShape {
    pub fn volume(&self) -> usize {
        self.width * self.height * self.channels
    }
}

/// A ready-to-run network.
pub trait InferenceEngine {
    fn input_shape(&self) -> InputShape;

    fn output_shape(&self) -> TensorShape;

    /// Blocking forward pass. `input.len()` equals `input_shape().volume()`
    /// and `output.len()` equals `output_shape().volume()`.
    fn infer(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError>;
}

/// Compiles, caches and restores engines for one runtime.
pub trait EngineBackend {
    type Engine: InferenceEngine;

    fn load(&self, engine_path: &Path) -> Result<Self::Engine, EngineError>;

    fn build(&self, model_path: &Path) -> Result<Self::Engine, EngineError>;

    fn save(&self, engine: &Self::Engine, engine_path: &Path) -> Result<(), EngineError>;
}

/// Cached engine location for a model: `model.onnx` -> `model.engine`.
pub fn engine_path_for(model_path: &Path) -> PathBuf {
    model_path.with_extension(ENGINE_EXTENSION)
}

/// Load the cached engine for `model_path`, or build and cache it.
///
/// A missing model (with no usable cache) and a failed build are errors.
/// Failing to write the cache is only logged: the built engine is usable.
pub fn load_or_build_engine<B: EngineBackend>(
    backend: &B,
    model_path: &Path,
) -> Result<B::Engine, EngineError> {
    let engine_path = engine_path_for(model_path);
    match backend.load(&engine_path) {
        Ok(engine) => {
            info!("loaded cached engine {}", engine_path.display());
            return Ok(engine);
        }
        Err(err) => debug!("no usable engine at {}: {err}", engine_path.display()),
    }

    if !model_path.exists() {
        return Err(EngineError::ArtifactMissing {
            path: model_path.to_path_buf(),
        });
    }

    info!("building engine from {}", model_path.display());
    let engine = backend.build(model_path)?;
    if let Err(err) = backend.save(&engine, &engine_path) {
        warn!("could not cache engine at {}: {err}", engine_path.display());
    }
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;

    #[derive(Debug)]
    struct NullEngine;

    impl InferenceEngine for NullEngine {
        fn input_shape(&self) -> InputShape {
            InputShape {
                width: 2,
                height: 2,
                channels: 3,
            }
        }

        fn output_shape(&self) -> TensorShape {
            TensorShape::new(1, 1)
        }

        fn infer(&mut self, _input: &[f32], _output: &mut [f32]) -> Result<(), EngineError> {
            Ok(())
        }
    }

    /// Stores "engines" as marker files.
    #[derive(Default)]
    struct FileBackend {
        builds: Cell<usize>,
        fail_build: bool,
        read_only: bool,
    }

    impl EngineBackend for FileBackend {
        type Engine = NullEngine;

        fn load(&self, engine_path: &Path) -> Result<NullEngine, EngineError> {
            fs::read(engine_path)?;
            Ok(NullEngine)
        }

        fn build(&self, model_path: &Path) -> Result<NullEngine, EngineError> {
            self.builds.set(self.builds.get() + 1);
            if self.fail_build {
                return Err(EngineError::Build {
                    path: model_path.to_path_buf(),
                    reason: "unsupported layer".into(),
                });
            }
            Ok(NullEngine)
        }

        fn save(&self, _engine: &NullEngine, engine_path: &Path) -> Result<(), EngineError> {
            if self.read_only {
                return Err(EngineError::Serialize("read-only".into()));
            }
            fs::write(engine_path, b"engine")?;
            Ok(())
        }
    }

    #[test]
    fn engine_path_replaces_extension() {
        assert_eq!(
            engine_path_for(Path::new("models/armor.onnx")),
            PathBuf::from("models/armor.engine")
        );
        assert_eq!(
            engine_path_for(Path::new("armor")),
            PathBuf::from("armor.engine")
        );
    }

    #[test]
    fn builds_once_then_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("armor.onnx");
        fs::write(&model, b"onnx").unwrap();
        let backend = FileBackend::default();

        load_or_build_engine(&backend, &model).unwrap();
        assert!(dir.path().join("armor.engine").exists());
        load_or_build_engine(&backend, &model).unwrap();
        assert_eq!(backend.builds.get(), 1);
    }

    #[test]
    fn missing_model_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("absent.onnx");
        let err = load_or_build_engine(&FileBackend::default(), &model).unwrap_err();
        assert!(matches!(err, EngineError::ArtifactMissing { .. }));
    }

    #[test]
    fn cached_engine_suffices_without_model() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("armor.engine"), b"engine").unwrap();
        let backend = FileBackend::default();
        load_or_build_engine(&backend, &dir.path().join("armor.onnx")).unwrap();
        assert_eq!(backend.builds.get(), 0);
    }

    #[test]
    fn build_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("armor.onnx");
        fs::write(&model, b"onnx").unwrap();
        let backend = FileBackend {
            fail_build: true,
            ..Default::default()
        };
        let err = load_or_build_engine(&backend, &model).unwrap_err();
        assert!(matches!(err, EngineError::Build { .. }));
    }

    #[test]
    fn save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("armor.onnx");
        fs::write(&model, b"onnx").unwrap();
        let backend = FileBackend {
            read_only: true,
            ..Default::default()
        };
        assert!(load_or_build_engine(&backend, &model).is_ok());
        assert!(!dir.path().join("armor.engine").exists());
    }
}
