use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Floor applied to rectangle sides so derived ratios stay finite.
pub const GEOMETRY_EPSILON: f32 = 1e-3;

/// Oriented rectangle as reported by contour / min-area-rect primitives.
///
/// `angle` is in degrees, measured the way image-space rotated rectangles
/// usually are (clockwise, because the y axis points down).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f32>,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

impl RotatedRect {
    pub fn new(center: Point2<f32>, width: f32, height: f32, angle: f32) -> Self {
        Self {
            center,
            width,
            height,
            angle,
        }
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn is_finite(&self) -> bool {
        self.center.x.is_finite()
            && self.center.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.angle.is_finite()
    }

    /// Corner decomposition in canonical order.
    ///
    /// `pt0` is the bottom-left corner of the unrotated rectangle, followed
    /// by top-left, top-right and bottom-right; `pt2`/`pt3` are the point
    /// reflections of `pt0`/`pt1` through the center.
    pub fn points(&self) -> [Point2<f32>; 4] {
        let rad = (self.angle as f64).to_radians();
        let b = rad.cos() as f32 * 0.5;
        let a = rad.sin() as f32 * 0.5;
        let c = self.center;

        let p0 = Point2::new(
            c.x - a * self.height - b * self.width,
            c.y + b * self.height - a * self.width,
        );
        let p1 = Point2::new(
            c.x + a * self.height - b * self.width,
            c.y - b * self.height - a * self.width,
        );
        let p2 = Point2::new(2.0 * c.x - p0.x, 2.0 * c.y - p0.y);
        let p3 = Point2::new(2.0 * c.x - p1.x, 2.0 * c.y - p1.y);
        [p0, p1, p2, p3]
    }

    /// Same rectangle with `height >= width` and `angle` in `(-90, 90]`.
    ///
    /// Any two descriptions of one oriented rectangle map to the same
    /// canonical value, so angles of equally tilted rectangles compare
    /// directly. A vertical bar has angle 0; leaning its lower end to the
    /// right gives a negative angle.
    pub fn canonical(&self) -> Self {
        let (width, height, angle) = if self.height < self.width {
            (self.height, self.width, self.angle - 90.0)
        } else {
            (self.width, self.height, self.angle)
        };
        Self {
            center: self.center,
            width,
            height,
            angle: normalize_half_turn(angle),
        }
    }

    /// Rebuild a rectangle from four corners given in perimeter order.
    ///
    /// The result is [canonical](Self::canonical): it does not depend on
    /// which corner comes first or on the winding direction.
    pub fn from_corners(corners: &[Point2<f32>; 4]) -> Self {
        let cx = corners.iter().map(|p| p.x).sum::<f32>() / 4.0;
        let cy = corners.iter().map(|p| p.y).sum::<f32>() / 4.0;
        let e0 = corners[1] - corners[0];
        let e1 = corners[2] - corners[1];
        let (across, along) = if e0.norm() <= e1.norm() {
            (e0, e1)
        } else {
            (e1, e0)
        };
        Self {
            center: Point2::new(cx, cy),
            width: across.norm(),
            height: along.norm(),
            angle: normalize_half_turn(across.y.atan2(across.x).to_degrees()),
        }
    }
}

/// Fold an undirected axis angle into `(-90, 90]` degrees.
fn normalize_half_turn(deg: f32) -> f32 {
    let a = (deg + 90.0).rem_euclid(180.0) - 90.0;
    if a <= -90.0 {
        a + 180.0
    } else {
        a
    }
}

/// Even-odd point-in-polygon test.
pub fn point_in_polygon(p: Point2<f32>, polygon: &[Point2<f32>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn axis_aligned_points_follow_canonical_order() {
        let r = RotatedRect::new(Point2::new(10.0, 20.0), 4.0, 2.0, 0.0);
        let p = r.points();
        assert_abs_diff_eq!(p[0].x, 8.0);
        assert_abs_diff_eq!(p[0].y, 21.0);
        assert_abs_diff_eq!(p[1].x, 8.0);
        assert_abs_diff_eq!(p[1].y, 19.0);
        assert_abs_diff_eq!(p[2].x, 12.0);
        assert_abs_diff_eq!(p[2].y, 19.0);
        assert_abs_diff_eq!(p[3].x, 12.0);
        assert_abs_diff_eq!(p[3].y, 21.0);
    }

    #[test]
    fn from_corners_recovers_size_and_center() {
        let r = RotatedRect::new(Point2::new(5.0, 5.0), 6.0, 2.0, 30.0);
        let p = r.points();
        let back = RotatedRect::from_corners(&p);
        assert_abs_diff_eq!(back.center.x, 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(back.center.y, 5.0, epsilon = 1e-4);
        assert_abs_diff_eq!(back.width, 2.0, epsilon = 1e-4);
        assert_abs_diff_eq!(back.height, 6.0, epsilon = 1e-4);
        assert_abs_diff_eq!(back.area(), r.area(), epsilon = 1e-3);
        assert_abs_diff_eq!(back.angle, -60.0, epsilon = 1e-3);
    }

    #[test]
    fn corner_order_does_not_change_the_angle() {
        let r = RotatedRect::new(Point2::new(40.0, 30.0), 3.0, 18.0, -8.0);
        let p = r.points();
        let rotations = [
            [p[0], p[1], p[2], p[3]],
            [p[1], p[2], p[3], p[0]],
            [p[2], p[3], p[0], p[1]],
            [p[3], p[0], p[1], p[2]],
            [p[3], p[2], p[1], p[0]],
            [p[0], p[3], p[2], p[1]],
        ];
        for corners in rotations {
            let back = RotatedRect::from_corners(&corners);
            assert_abs_diff_eq!(back.angle, -8.0, epsilon = 1e-3);
            assert_abs_diff_eq!(back.width, 3.0, epsilon = 1e-3);
            assert_abs_diff_eq!(back.height, 18.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn canonical_form_is_unique() {
        let c = Point2::new(0.0, 0.0);
        let forms = [
            RotatedRect::new(c, 2.0, 10.0, 10.0),
            RotatedRect::new(c, 2.0, 10.0, 190.0),
            RotatedRect::new(c, 2.0, 10.0, -170.0),
            RotatedRect::new(c, 10.0, 2.0, 100.0),
            RotatedRect::new(c, 10.0, 2.0, -80.0),
        ];
        for r in forms {
            let k = r.canonical();
            assert_abs_diff_eq!(k.width, 2.0);
            assert_abs_diff_eq!(k.height, 10.0);
            assert_abs_diff_eq!(k.angle, 10.0, epsilon = 1e-3);
        }

        let lying = RotatedRect::new(c, 10.0, 2.0, 0.0).canonical();
        assert_abs_diff_eq!(lying.angle, 90.0);
        let already = RotatedRect::new(c, 2.0, 3.0, 5.0);
        assert_eq!(already.canonical(), already);
    }

    #[test]
    fn polygon_membership() {
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        assert!(point_in_polygon(Point2::new(2.0, 2.0), &square));
        assert!(!point_in_polygon(Point2::new(5.0, 2.0), &square));
        assert!(!point_in_polygon(Point2::new(2.0, 2.0), &square[..2]));
    }
}
