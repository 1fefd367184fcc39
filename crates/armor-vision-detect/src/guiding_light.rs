use armor_vision_core::{label, Color, DrawPrimitive, FrameView, StageTimer};
use log::{debug, error};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::blob::{BlobParams, KeyPoint, SimpleBlobDetector};
use crate::detector::Detector;
use crate::mask::to_gray;
use crate::render::Canvas;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Guiding light seen as a blob.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuidingLight {
    pub center: Point2<f32>,
    pub diameter: f32,
}

impl From<KeyPoint> for GuidingLight {
    fn from(kp: KeyPoint) -> Self {
        Self {
            center: kp.pt,
            diameter: kp.size,
        }
    }
}

#[derive(Debug, Default)]
pub struct GuidingLightDetector {
    blob: SimpleBlobDetector,
    key_points: Vec<KeyPoint>,
    targets: Vec<GuidingLight>,
    timer: StageTimer,
}

impl GuidingLightDetector {
    pub fn new(params: BlobParams) -> Self {
        Self {
            blob: SimpleBlobDetector::new(params),
            ..Default::default()
        }
    }

    pub fn params(&self) -> &BlobParams {
        self.blob.params()
    }

    /// Replace the blob parameters; takes effect on the next frame.
    pub fn reset_params(&mut self, params: BlobParams) {
        self.blob.set_params(params);
        debug!("blob parameters reset");
    }

    pub fn key_points(&self) -> &[KeyPoint] {
        &self.key_points
    }
}

impl Detector for GuidingLightDetector {
    type Target = GuidingLight;

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn detect(&mut self, frame: &FrameView<'_>) -> &[GuidingLight] {
        self.targets.clear();
        self.key_points.clear();
        self.timer.start();
        if frame.is_valid() {
            self.key_points = self.blob.detect(&to_gray(frame));
            if self.key_points.is_empty() {
                debug!("no key points");
            }
            self.targets
                .extend(self.key_points.iter().copied().map(GuidingLight::from));
        } else {
            error!("invalid frame {}x{}", frame.width, frame.height);
        }
        self.timer.stop("find lights");
        &self.targets
    }

    fn targets(&self) -> &[GuidingLight] {
        &self.targets
    }

    fn visualize_result(&self, canvas: &mut Canvas<'_>, verbose: u8) {
        if verbose == 0 {
            return;
        }
        let mut prims = Vec::new();
        if verbose > 1 {
            prims.push(label(format!(
                "{} lights in {} ms",
                self.targets.len(),
                self.timer.last_ms()
            )));
        }
        for light in &self.targets {
            prims.push(DrawPrimitive::Circle {
                center: light.center,
                radius: 0.5 * light.diameter,
                color: Color::GREEN,
                filled: false,
            });
            if verbose > 2 {
                prims.push(DrawPrimitive::Circle {
                    center: light.center,
                    radius: 2.0,
                    color: Color::RED,
                    filled: true,
                });
            }
        }
        canvas.draw_all(&prims);
    }
}
