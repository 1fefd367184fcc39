/// Interleaved RGB, one byte per channel.
pub const FRAME_CHANNELS: usize = 3;

/// Borrowed camera frame, row-major RGB, `len = width * height * 3`.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned counterpart of [`FrameView`].
#[derive(Clone, Debug, Default)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl<'a> FrameView<'a> {
    /// Non-empty and the buffer length matches the declared dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self
                .width
                .checked_mul(self.height)
                .and_then(|n| n.checked_mul(FRAME_CHANNELS))
                == Some(self.data.len())
    }

    /// RGB triple at `(x, y)`; black outside the frame.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> [u8; 3] {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return [0, 0, 0];
        }
        let idx = (y as usize * self.width + x as usize) * FRAME_CHANNELS;
        match self.data.get(idx..idx + FRAME_CHANNELS) {
            Some(px) => [px[0], px[1], px[2]],
            None => [0, 0, 0],
        }
    }
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * FRAME_CHANNELS],
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y * self.width + x) * FRAME_CHANNELS;
        self.data[idx..idx + FRAME_CHANNELS].copy_from_slice(&rgb);
    }
}
