//! Contour extraction and shape measurements on binary masks.

use armor_vision_core::RotatedRect;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{convex_hull, min_area_rect};
use imageproc::point::Point;
use nalgebra::Point2;

/// Closed pixel chain traced around a connected region.
pub type PixelContour = Vec<Point<i32>>;

/// Outer borders of the foreground regions of `mask`.
pub fn outer_contours(mask: &GrayImage) -> Vec<PixelContour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer))
        .map(|c| c.points)
        .collect()
}

/// Outer and hole borders of `mask`.
pub fn all_contours(mask: &GrayImage) -> Vec<PixelContour> {
    find_contours::<i32>(mask)
        .into_iter()
        .map(|c| c.points)
        .collect()
}

pub fn to_point2(p: Point<i32>) -> Point2<f32> {
    Point2::new(p.x as f32, p.y as f32)
}

/// Minimum-area rectangle around the contour; `None` for fewer than three
/// points.
pub fn min_area_rotated_rect(contour: &[Point<i32>]) -> Option<RotatedRect> {
    if contour.len() < 3 {
        return None;
    }
    let corners = min_area_rect(contour).map(to_point2);
    Some(RotatedRect::from_corners(&corners))
}

/// Area of the convex hull of `contour`.
pub fn hull_area(contour: &[Point<i32>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }
    let hull = convex_hull(contour);
    polygon_moments(&hull).m00
}

/// Spatial and central moments of a closed polygon, up to second order.
///
/// Computed with Green's theorem over the polygon edges, so the contour
/// orientation does not matter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
}

impl Moments {
    pub fn centroid(&self) -> Option<Point2<f32>> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point2::new(
            (self.m10 / self.m00) as f32,
            (self.m01 / self.m00) as f32,
        ))
    }

    /// Ratio of the smallest to the largest principal inertia, in `[0, 1]`.
    pub fn inertia_ratio(&self) -> f64 {
        let denom = (2.0 * self.mu11).hypot(self.mu20 - self.mu02);
        if denom <= 1e-2 {
            return 1.0;
        }
        let cos = (self.mu20 - self.mu02) / denom;
        let sin = 2.0 * self.mu11 / denom;
        let half_sum = 0.5 * (self.mu20 + self.mu02);
        let half_diff = 0.5 * (self.mu20 - self.mu02);
        let i_min = half_sum - half_diff * cos - self.mu11 * sin;
        let i_max = half_sum + half_diff * cos + self.mu11 * sin;
        if i_max <= 0.0 {
            return 1.0;
        }
        i_min / i_max
    }
}

pub fn polygon_moments(points: &[Point<i32>]) -> Moments {
    let n = points.len();
    if n < 3 {
        return Moments::default();
    }

    let (mut a00, mut a10, mut a01, mut a20, mut a11, mut a02) = (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let (xi, yi) = (f64::from(p.x), f64::from(p.y));
        let (xj, yj) = (f64::from(q.x), f64::from(q.y));
        let cross = xi * yj - xj * yi;
        a00 += cross;
        a10 += cross * (xi + xj);
        a01 += cross * (yi + yj);
        a20 += cross * (xi * xi + xi * xj + xj * xj);
        a11 += cross * (xi * (2.0 * yi + yj) + xj * (yi + 2.0 * yj));
        a02 += cross * (yi * yi + yi * yj + yj * yj);
    }

    let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
    let m00 = sign * a00 / 2.0;
    if m00 == 0.0 {
        return Moments::default();
    }
    let m10 = sign * a10 / 6.0;
    let m01 = sign * a01 / 6.0;
    let m20 = sign * a20 / 12.0;
    let m11 = sign * a11 / 24.0;
    let m02 = sign * a02 / 12.0;

    let cx = m10 / m00;
    let cy = m01 / m00;
    Moments {
        m00,
        m10,
        m01,
        mu20: m20 - cx * m10,
        mu11: m11 - cx * m01,
        mu02: m02 - cy * m01,
    }
}
