//! Codec negotiation and verified writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowreplay_recorder::CapturedFrame;

use crate::{EncodeError, Result, StreamSpec, WriterBackend};

/// Codecs tried when none are configured, most preferred first.
pub const DEFAULT_CODEC_CANDIDATES: &[&str] = &["libx264", "mpeg4", "libxvid", "mjpeg"];

/// A video written and verified on disk.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub codec: String,
    pub frame_count: usize,
    pub fps: u32,
    pub size_bytes: u64,
}

impl EncodedVideo {
    pub fn duration_seconds(&self) -> f64 {
        self.frame_count as f64 / self.fps.max(1) as f64
    }
}

/// Writes frame sequences through the first codec the backend can open.
#[derive(Clone)]
pub struct VideoEncoder {
    backend: Arc<dyn WriterBackend>,
    candidates: Vec<String>,
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("candidates", &self.candidates)
            .finish_non_exhaustive()
    }
}

impl VideoEncoder {
    /// Create an encoder trying `candidates` in order. An empty list falls
    /// back to [`DEFAULT_CODEC_CANDIDATES`].
    pub fn new(backend: Arc<dyn WriterBackend>, candidates: Vec<String>) -> Self {
        let candidates = if candidates.is_empty() {
            DEFAULT_CODEC_CANDIDATES.iter().map(|c| c.to_string()).collect()
        } else {
            candidates
        };
        Self {
            backend,
            candidates,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Find the first candidate that can write a one-frame trial video
    /// next to `output`. Trial files never outlive this call.
    pub fn negotiate(&self, output: &Path, spec: StreamSpec) -> Result<String> {
        let blank = CapturedFrame::blank(spec.width, spec.height);

        for codec in &self.candidates {
            let trial = sibling_path(output, &format!("trial-{}", sanitize(codec)));
            let outcome = self.write_all(codec, &trial, spec, std::slice::from_ref(&blank));
            remove_if_exists(&trial);

            match outcome {
                Ok(()) => {
                    tracing::info!(codec = %codec, "Negotiated video codec");
                    return Ok(codec.clone());
                }
                Err(e) => {
                    tracing::debug!(codec = %codec, error = %e, "Codec trial failed");
                }
            }
        }

        tracing::error!(tried = ?self.candidates, "No usable video codec");
        Err(EncodeError::CodecUnavailable {
            tried: self.candidates.clone(),
        })
    }

    /// Encode `frames` to `output`.
    ///
    /// Frames are written to a hidden partial file which is verified and
    /// renamed into place. On any failure no file remains at `output` or
    /// the partial path.
    pub fn encode(&self, frames: &[CapturedFrame], fps: u32, output: &Path) -> Result<EncodedVideo> {
        let spec = validate(frames, fps)?;

        if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| EncodeError::io(dir, e))?;
        }

        let codec = self.negotiate(output, spec)?;

        let partial = PartialFile::new(sibling_path(output, "partial"));
        self.write_all(&codec, partial.path(), spec, frames)?;
        let size_bytes = verify(partial.path())?;
        partial.commit(output)?;

        tracing::info!(
            path = %output.display(),
            codec = %codec,
            frames = frames.len(),
            size_bytes,
            "Video written"
        );

        Ok(EncodedVideo {
            path: output.to_path_buf(),
            codec,
            frame_count: frames.len(),
            fps: spec.fps,
            size_bytes,
        })
    }

    fn write_all(
        &self,
        codec: &str,
        path: &Path,
        spec: StreamSpec,
        frames: &[CapturedFrame],
    ) -> Result<()> {
        let mut sink = self.backend.open(codec, path, spec)?;
        for frame in frames {
            sink.write_frame(&frame.data)?;
        }
        sink.finish()
    }
}

fn validate(frames: &[CapturedFrame], fps: u32) -> Result<StreamSpec> {
    let first = frames.first().ok_or(EncodeError::EmptySequence)?;
    let expected = first.dimensions();

    for (index, frame) in frames.iter().enumerate() {
        if frame.dimensions() != expected || !frame.is_usable() {
            return Err(EncodeError::FrameSizeMismatch {
                index,
                expected,
                actual: frame.dimensions(),
            });
        }
    }
    Ok(StreamSpec::new(expected.0, expected.1, fps.max(1)))
}

fn verify(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path).map_err(|_| EncodeError::Verification {
        path: path.to_path_buf(),
        reason: "file does not exist".into(),
    })?;
    if metadata.len() == 0 {
        return Err(EncodeError::Verification {
            path: path.to_path_buf(),
            reason: "file is empty".into(),
        });
    }
    Ok(metadata.len())
}

/// `dir/.stem.tag.ext` next to `output`, keeping the extension so the
/// writer picks the same container.
fn sibling_path(output: &Path, tag: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let name = match output.extension() {
        Some(ext) => format!(".{stem}.{tag}.{}", ext.to_string_lossy()),
        None => format!(".{stem}.{tag}"),
    };
    output.with_file_name(name)
}

fn sanitize(codec: &str) -> String {
    codec
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn remove_if_exists(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

/// Output under construction; removed on drop unless committed.
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn commit(mut self, target: &Path) -> Result<()> {
        fs::rename(&self.path, target).map_err(|e| EncodeError::io(target, e))?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.committed {
            remove_if_exists(&self.path);
        }
    }
}
