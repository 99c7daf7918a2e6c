//! Writer backend abstraction.

use std::path::Path;

use crate::Result;

/// Geometry and rate of a raw RGBA8 video stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl StreamSpec {
    pub const fn new(width: u32, height: u32, fps: u32) -> Self {
        Self { width, height, fps }
    }

    /// Bytes in one RGBA8 frame.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Opens video writers for a codec identifier.
pub trait WriterBackend: Send + Sync {
    /// Open a writer producing `path` with the given codec.
    ///
    /// Fails if the codec is unknown to the backend or the writer cannot
    /// be started.
    fn open(&self, codec: &str, path: &Path, spec: StreamSpec) -> Result<Box<dyn FrameSink>>;
}

/// An open writer accepting frames in order.
///
/// Dropping a sink without calling `finish` abandons the output.
pub trait FrameSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<()>;

    /// Flush and close the writer, reporting any deferred failure.
    fn finish(self: Box<Self>) -> Result<()>;
}
