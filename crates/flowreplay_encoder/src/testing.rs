//! In-memory writer backend for tests.
//!
//! `MemoryBackend` accepts a configurable set of codecs and writes a small
//! raw container (header plus frame bytes) so outputs exist on disk and can
//! be verified, without ffmpeg installed.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{EncodeError, FrameSink, Result, StreamSpec, WriterBackend};

/// Magic bytes at the start of every file the backend writes.
pub const MEMORY_CONTAINER_MAGIC: &[u8; 8] = b"FRRAWVID";

/// One writer opened through the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenRecord {
    pub codec: String,
    pub path: PathBuf,
    pub spec: StreamSpec,
}

/// Backend whose codec support is scripted.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    accepted: HashSet<String>,
    fail_on_finish: HashSet<String>,
    empty_output: bool,
    fail_after_frames: Option<usize>,
    opens: Arc<Mutex<Vec<OpenRecord>>>,
}

impl MemoryBackend {
    /// Backend that can open exactly the listed codecs.
    pub fn accepting(codecs: &[&str]) -> Self {
        Self {
            accepted: codecs.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    /// The codec opens but `finish` fails.
    pub fn failing_on_finish(mut self, codec: &str) -> Self {
        self.fail_on_finish.insert(codec.to_string());
        self
    }

    /// Writers report success but leave a zero-byte file.
    pub fn with_empty_output(mut self) -> Self {
        self.empty_output = true;
        self
    }

    /// Writers reject the frame after `n` frames were accepted.
    pub fn failing_after_frames(mut self, n: usize) -> Self {
        self.fail_after_frames = Some(n);
        self
    }

    /// Every `open` call so far, in order, including rejected codecs.
    pub fn opens(&self) -> Vec<OpenRecord> {
        self.opens.lock().clone()
    }
}

impl WriterBackend for MemoryBackend {
    fn open(&self, codec: &str, path: &Path, spec: StreamSpec) -> Result<Box<dyn FrameSink>> {
        self.opens.lock().push(OpenRecord {
            codec: codec.to_string(),
            path: path.to_path_buf(),
            spec,
        });
        if !self.accepted.contains(codec) {
            return Err(EncodeError::writer(codec, "codec not supported by backend"));
        }

        let file = File::create(path).map_err(|e| EncodeError::io(path, e))?;
        Ok(Box::new(MemorySink {
            codec: codec.to_string(),
            path: path.to_path_buf(),
            spec,
            file,
            frames: Vec::new(),
            fail_on_finish: self.fail_on_finish.contains(codec),
            empty_output: self.empty_output,
            fail_after_frames: self.fail_after_frames,
        }))
    }
}

struct MemorySink {
    codec: String,
    path: PathBuf,
    spec: StreamSpec,
    file: File,
    frames: Vec<Vec<u8>>,
    fail_on_finish: bool,
    empty_output: bool,
    fail_after_frames: Option<usize>,
}

impl FrameSink for MemorySink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<()> {
        if self.fail_after_frames == Some(self.frames.len()) {
            return Err(EncodeError::writer(&self.codec, "scripted frame failure"));
        }
        if rgba.len() != self.spec.frame_len() {
            return Err(EncodeError::writer(&self.codec, "frame size mismatch"));
        }
        self.frames.push(rgba.to_vec());
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if self.fail_on_finish {
            return Err(EncodeError::writer(&self.codec, "scripted finish failure"));
        }
        if self.empty_output {
            return Ok(());
        }

        let mut bytes = Vec::with_capacity(24 + self.frames.len() * self.spec.frame_len());
        bytes.extend_from_slice(MEMORY_CONTAINER_MAGIC);
        bytes.extend_from_slice(&self.spec.width.to_le_bytes());
        bytes.extend_from_slice(&self.spec.height.to_le_bytes());
        bytes.extend_from_slice(&self.spec.fps.to_le_bytes());
        bytes.extend_from_slice(&(self.frames.len() as u32).to_le_bytes());
        for frame in &self.frames {
            bytes.extend_from_slice(frame);
        }
        self.file
            .write_all(&bytes)
            .and_then(|_| self.file.flush())
            .map_err(|e| EncodeError::io(&self.path, e))
    }
}

/// Frame count stored in a file written by `MemoryBackend`.
pub fn read_frame_count(path: &Path) -> Option<u32> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.len() < 24 || &bytes[..8] != MEMORY_CONTAINER_MAGIC {
        return None;
    }
    let count: [u8; 4] = bytes[20..24].try_into().ok()?;
    Some(u32::from_le_bytes(count))
}
