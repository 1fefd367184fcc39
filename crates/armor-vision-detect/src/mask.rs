//! Per-pixel conversions from an RGB frame to single-channel masks.

use armor_vision_core::{FrameView, Team};
use image::{GrayImage, Luma};

const ON: Luma<u8> = Luma([255]);
const OFF: Luma<u8> = Luma([0]);

/// Luma (BT.601) of every pixel.
pub fn to_gray(frame: &FrameView) -> GrayImage {
    GrayImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        let [r, g, b] = frame.pixel(x as i32, y as i32);
        let l = 0.299 * f32::from(r) + 0.587 * f32::from(g) + 0.114 * f32::from(b);
        Luma([l.round().clamp(0.0, 255.0) as u8])
    })
}

/// `255` where `gray > threshold`, `0` elsewhere.
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            ON
        } else {
            OFF
        }
    })
}

/// Pixels lit in `team`'s colour.
///
/// A pixel belongs to red when `r - b > color_threshold` and
/// `r >= brightness_threshold`, symmetrically for blue. [`Team::Dead`]
/// accepts either colour.
pub fn team_mask(
    frame: &FrameView,
    team: Team,
    color_threshold: u8,
    brightness_threshold: u8,
) -> GrayImage {
    let diff = i16::from(color_threshold);
    GrayImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        let [r, _, b] = frame.pixel(x as i32, y as i32);
        let red = i16::from(r) - i16::from(b) > diff && r >= brightness_threshold;
        let blue = i16::from(b) - i16::from(r) > diff && b >= brightness_threshold;
        let lit = match team {
            Team::Red => red,
            Team::Blue => blue,
            Team::Dead => red || blue,
        };
        if lit {
            ON
        } else {
            OFF
        }
    })
}

/// Pixels whose colour satisfies `keep`.
pub fn color_mask(frame: &FrameView, keep: impl Fn([u8; 3]) -> bool) -> GrayImage {
    GrayImage::from_fn(frame.width as u32, frame.height as u32, |x, y| {
        if keep(frame.pixel(x as i32, y as i32)) {
            ON
        } else {
            OFF
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use armor_vision_core::Frame;

    fn two_pixel_frame() -> Frame {
        let mut frame = Frame::new(2, 1);
        frame.put_pixel(0, 0, [250, 40, 30]);
        frame.put_pixel(1, 0, [20, 60, 240]);
        frame
    }

    #[test]
    fn team_mask_separates_colours() {
        let frame = two_pixel_frame();
        let red = team_mask(&frame.view(), Team::Red, 60, 150);
        let blue = team_mask(&frame.view(), Team::Blue, 60, 150);
        let any = team_mask(&frame.view(), Team::Dead, 60, 150);
        assert_eq!(red.as_raw(), &vec![255, 0]);
        assert_eq!(blue.as_raw(), &vec![0, 255]);
        assert_eq!(any.as_raw(), &vec![255, 255]);
    }

    #[test]
    fn dim_pixels_are_rejected() {
        let frame = two_pixel_frame();
        let red = team_mask(&frame.view(), Team::Red, 60, 251);
        assert!(red.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn gray_and_binarize() {
        let mut frame = Frame::new(2, 1);
        frame.put_pixel(0, 0, [255, 255, 255]);
        let gray = to_gray(&frame.view());
        assert_eq!(gray.as_raw(), &vec![255, 0]);
        let bin = binarize(&gray, 255);
        assert_eq!(bin.as_raw(), &vec![0, 0]);
        let bin = binarize(&gray, 0);
        assert_eq!(bin.as_raw(), &vec![255, 0]);
    }
}
