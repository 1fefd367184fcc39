//! Multi-threshold blob detector.
//!
//! The gray image is binarized at a ladder of thresholds; at every level the
//! region borders are measured and filtered, and blob centres that reappear
//! close to each other across levels are grouped. Groups seen at
//! `min_repeatability` levels or more become [`KeyPoint`]s.

use std::f64::consts::PI;

use image::GrayImage;
use imageproc::geometry::arc_length;
use log::{debug, trace};
use nalgebra::Point2;
use serde::{Deserialize, Deserializer, Serialize};

use crate::contour::{all_contours, hull_area, polygon_moments, PixelContour};
use crate::mask::binarize;

/// Blob filter configuration.
///
/// Serialized with the camelCase keys used by the usual JSON parameter
/// documents; missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlobParams {
    pub threshold_step: f32,
    pub min_threshold: f32,
    pub max_threshold: f32,
    pub min_repeatability: usize,
    pub min_dist_between_blobs: f32,

    #[serde(deserialize_with = "flag")]
    pub filter_by_color: bool,
    pub blob_color: u8,

    #[serde(deserialize_with = "flag")]
    pub filter_by_area: bool,
    pub min_area: f32,
    pub max_area: f32,

    #[serde(deserialize_with = "flag")]
    pub filter_by_circularity: bool,
    pub min_circularity: f32,
    pub max_circularity: f32,

    #[serde(deserialize_with = "flag")]
    pub filter_by_inertia: bool,
    pub min_inertia_ratio: f32,
    pub max_inertia_ratio: f32,

    #[serde(deserialize_with = "flag")]
    pub filter_by_convexity: bool,
    pub min_convexity: f32,
    pub max_convexity: f32,
}

impl Default for BlobParams {
    fn default() -> Self {
        Self {
            threshold_step: 10.0,
            min_threshold: 0.0,
            max_threshold: 100.0,
            min_repeatability: 2,
            min_dist_between_blobs: 10.0,
            filter_by_color: true,
            blob_color: 0,
            filter_by_area: true,
            min_area: 200.0,
            max_area: 5000.0,
            filter_by_circularity: false,
            min_circularity: 0.1,
            max_circularity: f32::MAX,
            filter_by_inertia: true,
            min_inertia_ratio: 0.2,
            max_inertia_ratio: f32::MAX,
            filter_by_convexity: true,
            min_convexity: 0.65,
            max_convexity: f32::MAX,
        }
    }
}

/// Accepts `true`/`false` as well as the `0`/`1` integers older documents
/// store.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }
    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

/// Detected blob: centre and diameter in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyPoint {
    pub pt: Point2<f32>,
    pub size: f32,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    center: Point2<f32>,
    radius: f32,
}

#[inline]
fn outside(v: f64, min: f32, max: f32) -> bool {
    v < f64::from(min) || v >= f64::from(max)
}

#[derive(Clone, Debug, Default)]
pub struct SimpleBlobDetector {
    params: BlobParams,
}

impl SimpleBlobDetector {
    pub fn new(params: BlobParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BlobParams {
        &self.params
    }

    pub fn set_params(&mut self, params: BlobParams) {
        self.params = params;
    }

    pub fn detect(&self, gray: &GrayImage) -> Vec<KeyPoint> {
        let p = &self.params;
        if !(p.threshold_step > 0.0) || p.min_repeatability == 0 {
            debug!(
                "blob detector disabled: step {}, repeatability {}",
                p.threshold_step, p.min_repeatability
            );
            return Vec::new();
        }

        // Each group is kept sorted by radius.
        let mut groups: Vec<Vec<Candidate>> = Vec::new();
        let mut t = p.min_threshold;
        while t < p.max_threshold {
            let level = t.clamp(0.0, 255.0) as u8;
            let binary = binarize(gray, level);
            let found = self.find_blobs(&binary);
            trace!("threshold {level}: {} blobs", found.len());

            let mut fresh = Vec::new();
            for cand in found {
                let existing = groups.iter_mut().find(|g| {
                    let mid = g[g.len() / 2];
                    let dist = (mid.center - cand.center).norm();
                    dist < p.min_dist_between_blobs || dist < mid.radius || dist < cand.radius
                });
                match existing {
                    Some(group) => {
                        let at = group.partition_point(|c| c.radius < cand.radius);
                        group.insert(at, cand);
                    }
                    None => fresh.push(vec![cand]),
                }
            }
            groups.extend(fresh);
            t += p.threshold_step;
        }

        groups
            .into_iter()
            .filter(|g| g.len() >= p.min_repeatability)
            .map(|g| {
                let n = g.len() as f32;
                let sum = g
                    .iter()
                    .fold(Point2::origin(), |acc: Point2<f32>, c| acc + c.center.coords);
                KeyPoint {
                    pt: Point2::from(sum.coords / n),
                    size: 2.0 * g[g.len() / 2].radius,
                }
            })
            .collect()
    }

    fn find_blobs(&self, binary: &GrayImage) -> Vec<Candidate> {
        all_contours(binary)
            .iter()
            .filter_map(|c| self.measure(binary, c))
            .collect()
    }

    fn measure(&self, binary: &GrayImage, contour: &PixelContour) -> Option<Candidate> {
        let p = &self.params;
        let moments = polygon_moments(contour);
        let area = moments.m00;
        if area == 0.0 {
            return None;
        }

        if p.filter_by_area && outside(area, p.min_area, p.max_area) {
            return None;
        }

        if p.filter_by_circularity {
            let perimeter = arc_length(contour, true);
            let circularity = 4.0 * PI * area / (perimeter * perimeter);
            if outside(circularity, p.min_circularity, p.max_circularity) {
                return None;
            }
        }

        if p.filter_by_inertia
            && outside(moments.inertia_ratio(), p.min_inertia_ratio, p.max_inertia_ratio)
        {
            return None;
        }

        if p.filter_by_convexity {
            let hull = hull_area(contour);
            if hull <= 0.0 || outside(area / hull, p.min_convexity, p.max_convexity) {
                return None;
            }
        }

        let center = moments.centroid()?;
        if p.filter_by_color {
            let (x, y) = (center.x.round() as i64, center.y.round() as i64);
            let inside =
                x >= 0 && y >= 0 && (x as u32) < binary.width() && (y as u32) < binary.height();
            if !inside || binary.get_pixel(x as u32, y as u32)[0] != p.blob_color {
                return None;
            }
        }

        let mut dists: Vec<f32> = contour
            .iter()
            .map(|q| (Point2::new(q.x as f32, q.y as f32) - center).norm())
            .collect();
        dists.sort_by(f32::total_cmp);
        let n = dists.len();
        let radius = 0.5 * (dists[(n - 1) / 2] + dists[n / 2]);

        Some(Candidate { center, radius })
    }
}
