use armor_vision_core::{label, Color, DrawPrimitive, FrameView, RotatedRect, StageTimer};
use image::GrayImage;
use log::{debug, error};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::contour::{min_area_rotated_rect, outer_contours, polygon_moments};
use crate::detector::Detector;
use crate::mask::color_mask;
use crate::render::Canvas;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Ore cube segmentation and shape limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OreCubeParams {
    /// Gold: `r >= min_red`, `g >= min_green`, `b <= max_blue`.
    pub min_red: u8,
    pub min_green: u8,
    pub max_blue: u8,
    pub detect_silver: bool,
    /// Silver: every channel at least this bright.
    pub silver_min_value: u8,
    /// Silver: maximum spread between the channels.
    pub silver_max_spread: u8,
    /// Contour area window, px².
    pub min_area: f32,
    pub max_area: f32,
    /// Maximum long/short side ratio of the bounding rectangle.
    pub max_side_ratio: f32,
    /// Minimum share of the bounding rectangle covered by the contour.
    pub min_fill_ratio: f32,
}

impl Default for OreCubeParams {
    fn default() -> Self {
        Self {
            min_red: 150,
            min_green: 110,
            max_blue: 110,
            detect_silver: true,
            silver_min_value: 170,
            silver_max_spread: 30,
            min_area: 400.0,
            max_area: 100_000.0,
            max_side_ratio: 1.4,
            min_fill_ratio: 0.7,
        }
    }
}

impl OreCubeParams {
    fn is_gold(&self, [r, g, b]: [u8; 3]) -> bool {
        r >= self.min_red && g >= self.min_green && b <= self.max_blue
    }

    fn is_silver(&self, px: [u8; 3]) -> bool {
        let lo = px.iter().copied().min().unwrap_or(0);
        let hi = px.iter().copied().max().unwrap_or(0);
        lo >= self.silver_min_value && hi - lo <= self.silver_max_spread
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OreKind {
    #[default]
    Gold,
    Silver,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreCube {
    pub kind: OreKind,
    pub rect: RotatedRect,
    /// Contour area, px².
    pub area: f32,
}

impl OreCube {
    pub fn center(&self) -> Point2<f32> {
        self.rect.center
    }

    /// Mean side length of the face.
    pub fn side(&self) -> f32 {
        0.5 * (self.rect.width + self.rect.height)
    }
}

#[derive(Debug, Default)]
pub struct OreCubeDetector {
    params: OreCubeParams,
    targets: Vec<OreCube>,
    timer: StageTimer,
}

impl OreCubeDetector {
    pub fn new(params: OreCubeParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &OreCubeParams {
        &self.params
    }

    pub fn reset_params(&mut self, params: OreCubeParams) {
        self.params = params;
        debug!("ore cube parameters reset");
    }

    fn find_cubes(&mut self, frame: &FrameView) {
        let gold = color_mask(frame, |px| self.params.is_gold(px));
        self.collect(&gold, OreKind::Gold);
        if self.params.detect_silver {
            let silver = color_mask(frame, |px| self.params.is_silver(px));
            self.collect(&silver, OreKind::Silver);
        }
        // Largest (closest) first.
        self.targets.sort_by(|a, b| b.area.total_cmp(&a.area));
    }

    fn collect(&mut self, mask: &GrayImage, kind: OreKind) {
        let p = &self.params;
        for contour in outer_contours(mask) {
            let area = polygon_moments(&contour).m00 as f32;
            if area < p.min_area || area > p.max_area {
                continue;
            }
            let Some(rect) = min_area_rotated_rect(&contour) else {
                continue;
            };
            let long = rect.width.max(rect.height);
            let short = rect.width.min(rect.height);
            if short <= 0.0 || long / short > p.max_side_ratio {
                continue;
            }
            if area / rect.area() < p.min_fill_ratio {
                continue;
            }
            self.targets.push(OreCube { kind, rect, area });
        }
    }
}

impl Detector for OreCubeDetector {
    type Target = OreCube;

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    fn detect(&mut self, frame: &FrameView<'_>) -> &[OreCube] {
        self.targets.clear();
        self.timer.start();
        if frame.is_valid() {
            self.find_cubes(frame);
            if self.targets.is_empty() {
                debug!("no ore cube");
            }
        } else {
            error!("invalid frame {}x{}", frame.width, frame.height);
        }
        self.timer.stop("find ore cubes");
        &self.targets
    }

    fn targets(&self) -> &[OreCube] {
        &self.targets
    }

    fn visualize_result(&self, canvas: &mut Canvas<'_>, verbose: u8) {
        if verbose == 0 {
            return;
        }
        let mut prims = Vec::new();
        if verbose > 1 {
            prims.push(label(format!(
                "{} ore cubes in {} ms",
                self.targets.len(),
                self.timer.last_ms()
            )));
        }
        for cube in &self.targets {
            let color = match cube.kind {
                OreKind::Gold => Color::GREEN,
                OreKind::Silver => Color::CYAN,
            };
            prims.push(DrawPrimitive::Polygon {
                points: cube.rect.points().to_vec(),
                color,
            });
            if verbose > 2 {
                prims.push(DrawPrimitive::Circle {
                    center: cube.center(),
                    radius: 3.0,
                    color: Color::RED,
                    filled: true,
                });
                prims.push(DrawPrimitive::Text {
                    origin: cube.center(),
                    text: format!("{:.0} px", cube.side()),
                    scale: 14.0,
                    color: Color::YELLOW,
                });
            }
        }
        canvas.draw_all(&prims);
    }
}
