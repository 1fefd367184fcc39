//! One-shot detection on an `image::RgbImage`.

use ab_glyph::FontArc;
use armor_vision_core::{Armor, ScopedTimer, Team};
use armor_vision_detect::{
    frame_view, Buff, BuffDetector, Canvas, Detector, GuidingLight, GuidingLightDetector, OreCube,
    OreCubeDetector, SnipeDetector,
};
use image::RgbImage;
use log::info;
use serde::{Deserialize, Serialize};

use crate::io::{DetectConfig, DetectorKind, DetectorParams};

/// Targets found by one detector, tagged with its kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "targets", rename_all = "snake_case")]
pub enum Targets {
    GuidingLight(Vec<GuidingLight>),
    Snipe(Vec<Armor>),
    Buff(Vec<Buff>),
    OreCube(Vec<OreCube>),
}

impl Targets {
    pub fn len(&self) -> usize {
        match self {
            Targets::GuidingLight(t) => t.len(),
            Targets::Snipe(t) => t.len(),
            Targets::Buff(t) => t.len(),
            Targets::OreCube(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub width: u32,
    pub height: u32,
    pub team: Team,
    pub elapsed_ms: f64,
    #[serde(flatten)]
    pub targets: Targets,
}

impl DetectionReport {
    pub fn kind(&self) -> DetectorKind {
        match self.targets {
            Targets::GuidingLight(_) => DetectorKind::GuidingLight,
            Targets::Snipe(_) => DetectorKind::Snipe,
            Targets::Buff(_) => DetectorKind::Buff,
            Targets::OreCube(_) => DetectorKind::OreCube,
        }
    }
}

/// Overlay settings for [`run_detection`].
#[derive(Clone, Copy, Default)]
pub struct Overlay<'a> {
    /// `0` leaves the image untouched.
    pub verbose: u8,
    pub font: Option<&'a FontArc>,
}

/// Build the configured detector, run it once on `image` and, when
/// `overlay.verbose > 0`, draw the result onto the same image.
pub fn run_detection(
    config: &DetectConfig,
    image: &mut RgbImage,
    overlay: Overlay<'_>,
) -> DetectionReport {
    let timer = ScopedTimer::new("detection");
    let targets = match &config.detector {
        DetectorParams::GuidingLight(p) => Targets::GuidingLight(run(
            &mut GuidingLightDetector::new(p.clone()),
            image,
            overlay,
        )),
        DetectorParams::Snipe(p) => Targets::Snipe(run(
            &mut SnipeDetector::new(p.clone(), config.team),
            image,
            overlay,
        )),
        DetectorParams::Buff(p) => Targets::Buff(run(
            &mut BuffDetector::new(p.clone(), config.team),
            image,
            overlay,
        )),
        DetectorParams::OreCube(p) => Targets::OreCube(run(
            &mut OreCubeDetector::new(p.clone()),
            image,
            overlay,
        )),
    };
    let report = DetectionReport {
        width: image.width(),
        height: image.height(),
        team: config.team,
        elapsed_ms: timer.elapsed().as_secs_f64() * 1e3,
        targets,
    };
    info!(
        "{}: {} targets in {:.2} ms",
        report.kind(),
        report.targets.len(),
        report.elapsed_ms
    );
    report
}

fn run<D>(detector: &mut D, image: &mut RgbImage, overlay: Overlay<'_>) -> Vec<D::Target>
where
    D: Detector,
    D::Target: Clone,
{
    let targets = detector.detect(&frame_view(image)).to_vec();
    if overlay.verbose > 0 {
        let mut canvas = Canvas::new(image);
        if let Some(font) = overlay.font {
            canvas = canvas.with_font(font);
        }
        detector.visualize_result(&mut canvas, overlay.verbose);
    }
    targets
}
