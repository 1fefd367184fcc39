use armor_vision_core::{label, Color, DrawPrimitive, FrameView};
use armor_vision_nn::{InferenceEngine, NeuralDetector, RawDetection};
use nalgebra::Point2;

use crate::render::Canvas;

/// Uniform contract of every per-frame detector.
///
/// `detect` replaces the previous results and never fails: unusable input
/// is logged and yields an empty slice. The returned slice stays valid until
/// the next `detect`; copy it to keep it longer.
///
/// `visualize_result` only draws. Verbosity `0` draws nothing, `1` adds
/// target outlines, `2` adds a count and timing caption, `3` and above add
/// per-target labels and keypoints.
pub trait Detector {
    type Target;

    fn detect(&mut self, frame: &FrameView<'_>) -> &[Self::Target];

    /// Results of the last `detect`.
    fn targets(&self) -> &[Self::Target];

    fn visualize_result(&self, canvas: &mut Canvas<'_>, verbose: u8);
}

impl<E: InferenceEngine> Detector for NeuralDetector<E> {
    type Target = RawDetection;

    fn detect(&mut self, frame: &FrameView<'_>) -> &[RawDetection] {
        NeuralDetector::detect(self, frame)
    }

    fn targets(&self) -> &[RawDetection] {
        self.detections()
    }

    fn visualize_result(&self, canvas: &mut Canvas<'_>, verbose: u8) {
        if verbose == 0 {
            return;
        }
        let mut prims = Vec::new();
        if verbose > 1 {
            prims.push(label(format!(
                "{} detections in {} ms",
                self.detections().len(),
                self.last_duration().as_millis()
            )));
        }
        for det in self.detections() {
            prims.push(DrawPrimitive::Polygon {
                points: vec![
                    Point2::new(det.left(), det.top()),
                    Point2::new(det.right(), det.top()),
                    Point2::new(det.right(), det.bottom()),
                    Point2::new(det.left(), det.bottom()),
                ],
                color: Color::GREEN,
            });
            if verbose > 2 {
                prims.push(DrawPrimitive::Text {
                    origin: Point2::new(det.left(), det.top() - 14.0),
                    text: format!("{} {:.2}", det.class_id, det.confidence),
                    scale: 14.0,
                    color: Color::YELLOW,
                });
            }
        }
        canvas.draw_all(&prims);
    }
}
