use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::{RotatedRect, GEOMETRY_EPSILON};

/// One LED strip seen on a target, derived from an oriented rectangle.
///
/// The source rectangle is stored in [canonical](RotatedRect::canonical)
/// form, so `length`/`width` are its long/short sides, `aspect_ratio >= 1`
/// always holds and equally tilted bars report equal angles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LightBar {
    rect: RotatedRect,
    length: f32,
    width: f32,
    vertices: [Point2<f32>; 4],
}

impl LightBar {
    pub fn new(rect: RotatedRect) -> Self {
        let rect = rect.canonical();
        let w = finite_side(rect.width);
        let h = finite_side(rect.height);
        let clamped = RotatedRect {
            width: w,
            height: h,
            ..rect
        };
        Self {
            rect,
            length: w.max(h),
            width: w.min(h),
            vertices: clamped.points(),
        }
    }

    #[inline]
    pub fn image_center(&self) -> Point2<f32> {
        self.rect.center
    }

    /// Rotation of the long axis from vertical, degrees in `(-90, 90]`.
    ///
    /// Equals `-tilt()` for every bar that is not lying flat.
    #[inline]
    pub fn image_angle(&self) -> f32 {
        self.rect.angle
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.length
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.length * self.width
    }

    #[inline]
    pub fn image_aspect_ratio(&self) -> f32 {
        self.length / self.width
    }

    /// Corners in the source rectangle's canonical order.
    #[inline]
    pub fn image_vertices(&self) -> &[Point2<f32>; 4] {
        &self.vertices
    }

    pub fn rect(&self) -> &RotatedRect {
        &self.rect
    }

    /// Upper end of the long axis (smaller image y).
    pub fn top(&self) -> Point2<f32> {
        self.endpoints().0
    }

    /// Lower end of the long axis (larger image y).
    pub fn bottom(&self) -> Point2<f32> {
        self.endpoints().1
    }

    /// Deviation of the long axis from vertical in degrees, in `[-90, 90]`.
    ///
    /// Positive when the lower end leans to the right.
    pub fn tilt(&self) -> f32 {
        let (top, bottom) = self.endpoints();
        let d = bottom - top;
        d.x.atan2(d.y).to_degrees()
    }

    fn endpoints(&self) -> (Point2<f32>, Point2<f32>) {
        let v = &self.vertices;
        let e01 = (v[1] - v[0]).norm();
        let e12 = (v[2] - v[1]).norm();
        // The short edges cap the bar; their midpoints span the long axis.
        let (a, b) = if e01 <= e12 {
            (midpoint(v[0], v[1]), midpoint(v[2], v[3]))
        } else {
            (midpoint(v[1], v[2]), midpoint(v[3], v[0]))
        };
        if a.y <= b.y {
            (a, b)
        } else {
            (b, a)
        }
    }
}

impl From<RotatedRect> for LightBar {
    fn from(rect: RotatedRect) -> Self {
        Self::new(rect)
    }
}

fn finite_side(v: f32) -> f32 {
    if v.is_finite() {
        v.abs().max(GEOMETRY_EPSILON)
    } else {
        GEOMETRY_EPSILON
    }
}

fn midpoint(a: Point2<f32>, b: Point2<f32>) -> Point2<f32> {
    Point2::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y))
}
