//! Captured frames and frame sequences.
//!
//! Provides functionality to:
//! - Hold RGBA8 viewport captures tagged with their simulated time
//! - Substitute blank canvases when a capture fails
//! - Conform captures to the standard size of a sequence

/// Width of the blank canvas used when no capture is available.
pub const FALLBACK_FRAME_WIDTH: u32 = 1280;
/// Height of the blank canvas used when no capture is available.
pub const FALLBACK_FRAME_HEIGHT: u32 = 720;

/// Raw captured framebuffer data.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedFrame {
    /// Raw pixel data (RGBA8, row-major)
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame number within the sequence
    pub frame_number: u64,
    /// Simulated replay time in seconds
    pub simulated_time: f64,
}

impl CapturedFrame {
    /// Create a new captured frame.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            frame_number: 0,
            simulated_time: 0.0,
        }
    }

    /// An opaque white canvas.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(vec![255; width as usize * height as usize * 4], width, height)
    }

    /// Create with frame number.
    pub fn with_frame_number(mut self, frame: u64) -> Self {
        self.frame_number = frame;
        self
    }

    /// Create with simulated time.
    pub fn with_simulated_time(mut self, seconds: f64) -> Self {
        self.simulated_time = seconds;
        self
    }

    /// Get the number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Get expected data length for RGBA8.
    pub fn expected_size(&self) -> usize {
        self.pixel_count() * 4
    }

    /// Whether the frame holds pixels and its buffer matches its size.
    pub fn is_usable(&self) -> bool {
        self.pixel_count() > 0 && self.data.len() == self.expected_size()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get a pixel at (x, y) as RGBA.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data
            .get(idx..idx + 4)
            .map(|px| [px[0], px[1], px[2], px[3]])
    }

    /// Copy this frame onto a white canvas of the given size, cropping or
    /// padding at the right and bottom edges. Unusable frames become blank.
    pub fn conform_to(self, width: u32, height: u32) -> Self {
        if self.is_usable() && self.dimensions() == (width, height) {
            return self;
        }
        let mut out = Self::blank(width, height)
            .with_frame_number(self.frame_number)
            .with_simulated_time(self.simulated_time);
        if !self.is_usable() {
            return out;
        }
        let copy_w = self.width.min(width) as usize * 4;
        let rows = self.height.min(height) as usize;
        let src_stride = self.width as usize * 4;
        let dst_stride = width as usize * 4;
        for row in 0..rows {
            let src = &self.data[row * src_stride..row * src_stride + copy_w];
            out.data[row * dst_stride..row * dst_stride + copy_w].copy_from_slice(src);
        }
        out
    }
}

/// Ordered frames of one replay, all sharing one size.
#[derive(Debug, Default)]
pub struct FrameSequence {
    frames: Vec<CapturedFrame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    /// Append a frame, conforming it to the size of the first frame.
    pub fn push(&mut self, frame: CapturedFrame) {
        let frame = match self.dimensions() {
            Some((w, h)) => frame.conform_to(w, h),
            None => frame,
        };
        self.frames.push(frame);
    }

    /// Size shared by every frame, once one has been pushed.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(CapturedFrame::dimensions)
    }

    /// Get the number of captured frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Get a frame by index.
    pub fn get(&self, index: usize) -> Option<&CapturedFrame> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> CapturedFrame {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        CapturedFrame::new(data, width, height)
    }

    #[test]
    fn blank_is_opaque_white() {
        let frame = CapturedFrame::blank(4, 3);
        assert_eq!(frame.expected_size(), 48);
        assert!(frame.is_usable());
        assert_eq!(frame.get_pixel(3, 2), Some([255, 255, 255, 255]));
        assert_eq!(frame.get_pixel(4, 0), None);
    }

    #[test]
    fn empty_or_truncated_buffers_are_unusable() {
        assert!(!CapturedFrame::new(Vec::new(), 0, 0).is_usable());
        assert!(!CapturedFrame::new(vec![0; 7], 2, 1).is_usable());
    }

    #[test]
    fn conform_crops_and_pads() {
        let frame = solid(4, 4, [1, 2, 3, 255]).with_frame_number(9);
        let wide = frame.clone().conform_to(6, 2);
        assert_eq!(wide.dimensions(), (6, 2));
        assert_eq!(wide.frame_number, 9);
        assert_eq!(wide.get_pixel(3, 1), Some([1, 2, 3, 255]));
        assert_eq!(wide.get_pixel(5, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn sequence_keeps_first_frame_size() {
        let mut seq = FrameSequence::new();
        assert!(seq.dimensions().is_none());

        seq.push(solid(8, 6, [0, 0, 0, 255]));
        seq.push(solid(3, 3, [9, 9, 9, 255]));

        assert_eq!(seq.len(), 2);
        assert_eq!(seq.dimensions(), Some((8, 6)));
        assert_eq!(seq.get(1).unwrap().dimensions(), (8, 6));
        assert_eq!(seq.get(1).unwrap().get_pixel(7, 5), Some([255, 255, 255, 255]));
    }
}
