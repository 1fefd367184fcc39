use std::path::Path;
use std::time::Duration;

use armor_vision_core::{FrameView, StageTimer, FRAME_CHANNELS};
use log::{debug, error};
use serde::{Deserialize, Serialize};

use crate::decode::decode;
use crate::detection::RawDetection;
use crate::engine::{load_or_build_engine, EngineBackend, EngineError, InferenceEngine, InputShape};
use crate::nms::non_max_suppression;

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralDetectorParams {
    /// Objectness an anchor must exceed to be decoded.
    pub conf_threshold: f32,
    /// IoU above which the weaker of two detections is suppressed.
    pub nms_threshold: f32,
}

impl Default for NeuralDetectorParams {
    fn default() -> Self {
        Self {
            conf_threshold: 0.5,
            nms_threshold: 0.45,
        }
    }
}

/// Frame -> engine -> decode -> NMS, one blocking inference per call.
pub struct NeuralDetector<E> {
    engine: E,
    params: NeuralDetectorParams,
    input: Vec<f32>,
    output: Vec<f32>,
    detections: Vec<RawDetection>,
    timer: StageTimer,
}

impl<E: InferenceEngine> NeuralDetector<E> {
    pub fn new(engine: E, params: NeuralDetectorParams) -> Result<Self, EngineError> {
        let out_shape = engine.output_shape();
        if !out_shape.is_decodable() {
            return Err(EngineError::InvalidOutputShape {
                row_len: out_shape.row_len,
            });
        }
        let input = Vec::with_capacity(engine.input_shape().volume());
        Ok(Self {
            output: vec![0.0; out_shape.volume()],
            input,
            engine,
            params,
            detections: Vec::new(),
            timer: StageTimer::new(),
        })
    }

    /// Restore or build the engine for `model_path` and wrap it.
    pub fn from_backend<B>(
        backend: &B,
        model_path: &Path,
        params: NeuralDetectorParams,
    ) -> Result<Self, EngineError>
    where
        B: EngineBackend<Engine = E>,
    {
        let engine = load_or_build_engine(backend, model_path)?;
        Self::new(engine, params)
    }

    pub fn params(&self) -> &NeuralDetectorParams {
        &self.params
    }

    pub fn set_params(&mut self, params: NeuralDetectorParams) {
        self.params = params;
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Detections of the last call; replaced by the next one.
    pub fn detections(&self) -> &[RawDetection] {
        &self.detections
    }

    pub fn last_duration(&self) -> Duration {
        self.timer.last()
    }

    /// Run the full pipeline on `frame`, surfacing engine failures.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn try_detect(&mut self, frame: &FrameView) -> Result<&[RawDetection], EngineError> {
        self.detections.clear();
        self.timer.start();
        let result = self.run(frame);
        self.timer.stop("neural detection");
        result.map(|()| self.detections.as_slice())
    }

    /// Like [`try_detect`](Self::try_detect) but failures are logged and
    /// yield an empty result.
    pub fn detect(&mut self, frame: &FrameView) -> &[RawDetection] {
        if let Err(err) = self.try_detect(frame) {
            error!("neural detection skipped: {err}");
        }
        &self.detections
    }

    fn run(&mut self, frame: &FrameView) -> Result<(), EngineError> {
        let expected = self.engine.input_shape();
        let actual = InputShape {
            width: frame.width,
            height: frame.height,
            channels: FRAME_CHANNELS,
        };
        if actual != expected || !frame.is_valid() {
            return Err(EngineError::ShapeMismatch { expected, actual });
        }

        preprocess(frame, &mut self.input);
        self.engine.infer(&self.input, &mut self.output)?;

        let decoded = decode(
            &self.output,
            self.engine.output_shape(),
            self.params.conf_threshold,
        );
        let n_decoded = decoded.len();
        self.detections = non_max_suppression(decoded, self.params.nms_threshold);
        debug!(
            "{n_decoded} anchors above threshold, {} after nms",
            self.detections.len()
        );
        Ok(())
    }
}

/// Scale interleaved `u8` pixels to `[0, 1]`, keeping HWC order.
pub fn preprocess(frame: &FrameView, out: &mut Vec<f32>) {
    out.clear();
    out.extend(frame.data.iter().map(|&v| f32::from(v) / 255.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::TensorShape;
    use approx::assert_relative_eq;
    use armor_vision_core::Frame;

    /// Replays a fixed output tensor.
    struct ScriptedEngine {
        input: InputShape,
        shape: TensorShape,
        output: Vec<f32>,
        calls: usize,
    }

    impl ScriptedEngine {
        fn new(output: Vec<f32>, shape: TensorShape) -> Self {
            Self {
                input: InputShape {
                    width: 4,
                    height: 2,
                    channels: 3,
                },
                shape,
                output,
                calls: 0,
            }
        }
    }

    impl InferenceEngine for ScriptedEngine {
        fn input_shape(&self) -> InputShape {
            self.input
        }

        fn output_shape(&self) -> TensorShape {
            self.shape
        }

        fn infer(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), EngineError> {
            assert_eq!(input.len(), self.input.volume());
            self.calls += 1;
            output.copy_from_slice(&self.output);
            Ok(())
        }
    }

    #[test]
    fn single_anchor_round_trip() {
        let engine = ScriptedEngine::new(
            vec![100.0, 100.0, 20.0, 20.0, 0.9, 0.8],
            TensorShape::new(1, 1),
        );
        let mut detector = NeuralDetector::new(engine, NeuralDetectorParams::default()).unwrap();
        let frame = Frame::new(4, 2);

        let dets = detector.detect(&frame.view());
        assert_eq!(dets.len(), 1);
        assert_relative_eq!(dets[0].confidence, 0.72, epsilon = 1e-6);
        assert_relative_eq!(dets[0].x_center, 100.0);
        assert_eq!(dets[0].class_id, 0);
    }

    #[test]
    fn duplicates_are_suppressed() {
        let engine = ScriptedEngine::new(
            vec![
                50.0, 50.0, 10.0, 10.0, 0.9, 0.9, //
                51.0, 50.0, 10.0, 10.0, 0.8, 0.9,
            ],
            TensorShape::new(2, 1),
        );
        let mut detector = NeuralDetector::new(engine, NeuralDetectorParams::default()).unwrap();
        let frame = Frame::new(4, 2);
        assert_eq!(detector.detect(&frame.view()).len(), 1);
    }

    #[test]
    fn wrong_frame_size_yields_nothing() {
        let engine = ScriptedEngine::new(
            vec![100.0, 100.0, 20.0, 20.0, 0.9, 0.8],
            TensorShape::new(1, 1),
        );
        let mut detector = NeuralDetector::new(engine, NeuralDetectorParams::default()).unwrap();
        let frame = Frame::new(8, 8);

        let err = detector.try_detect(&frame.view()).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));
        assert!(detector.detect(&frame.view()).is_empty());
        assert_eq!(detector.engine().calls, 0);
    }

    #[test]
    fn previous_results_are_cleared() {
        let engine = ScriptedEngine::new(
            vec![100.0, 100.0, 20.0, 20.0, 0.9, 0.8],
            TensorShape::new(1, 1),
        );
        let mut detector = NeuralDetector::new(engine, NeuralDetectorParams::default()).unwrap();
        assert_eq!(detector.detect(&Frame::new(4, 2).view()).len(), 1);
        assert!(detector.detect(&Frame::new(1, 1).view()).is_empty());
        assert!(detector.detections().is_empty());
    }

    #[test]
    fn classless_engine_is_rejected() {
        let engine = ScriptedEngine::new(
            Vec::new(),
            TensorShape {
                num_anchors: 4,
                row_len: 5,
            },
        );
        let err = NeuralDetector::new(engine, NeuralDetectorParams::default())
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::InvalidOutputShape { row_len: 5 }));
    }

    #[test]
    fn preprocess_scales_in_place_order() {
        let data = [0u8, 255, 51, 102, 204, 255];
        let frame = FrameView {
            width: 2,
            height: 1,
            data: &data,
        };
        let mut out = Vec::new();
        preprocess(&frame, &mut out);
        assert_eq!(out.len(), 6);
        assert_relative_eq!(out[0], 0.0);
        assert_relative_eq!(out[1], 1.0);
        assert_relative_eq!(out[2], 0.2);
        assert_relative_eq!(out[4], 0.8);
    }
}
