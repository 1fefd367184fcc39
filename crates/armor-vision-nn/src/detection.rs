use serde::{Deserialize, Serialize};

/// One decoded anchor: an image-space box given by center and size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    /// `objectness * best_class_probability`.
    pub confidence: f32,
    pub class_id: usize,
}

impl RawDetection {
    #[inline]
    pub fn left(&self) -> f32 {
        self.x_center - self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x_center + self.width / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y_center - self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y_center + self.height / 2.0
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Intersection-over-union of two center/size boxes.
///
/// The overlap test runs on the intersection bounds: boxes that only touch
/// produce a zero-area intersection and therefore an IoU of 0.
pub fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let left = a.left().max(b.left());
    let right = a.right().min(b.right());
    let top = a.top().max(b.top());
    let bottom = a.bottom().min(b.bottom());

    if top > bottom || left > right {
        return 0.0;
    }

    let inter = (right - left) * (bottom - top);
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        return 0.0;
    }
    inter / union
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn det(x: f32, y: f32, w: f32, h: f32) -> RawDetection {
        RawDetection {
            x_center: x,
            y_center: y,
            width: w,
            height: h,
            confidence: 1.0,
            class_id: 0,
        }
    }

    #[test]
    fn identical_boxes_have_unit_iou() {
        let a = det(10.0, 10.0, 4.0, 6.0);
        assert_relative_eq!(iou(&a, &a), 1.0);
    }

    #[test]
    fn partial_overlap() {
        // [0,10]x[0,10] vs [6,16]x[0,10]: 40 / 160.
        let a = det(5.0, 5.0, 10.0, 10.0);
        let b = det(11.0, 5.0, 10.0, 10.0);
        assert_relative_eq!(iou(&a, &b), 0.25);
        assert_relative_eq!(iou(&b, &a), 0.25);
    }

    #[test]
    fn touching_and_disjoint_are_zero() {
        let a = det(5.0, 5.0, 10.0, 10.0);
        let touching = det(15.0, 5.0, 10.0, 10.0);
        let far = det(50.0, 50.0, 10.0, 10.0);
        assert_eq!(iou(&a, &touching), 0.0);
        assert_eq!(iou(&a, &far), 0.0);
    }

    #[test]
    fn degenerate_boxes_do_not_produce_nan() {
        let a = det(5.0, 5.0, 0.0, 0.0);
        assert_eq!(iou(&a, &a), 0.0);
    }
}
