//! ffmpeg sidecar backend.
//!
//! Raw RGBA frames are piped to an `ffmpeg` child process which encodes
//! them with the requested codec. The container is chosen by ffmpeg from
//! the output file extension.

use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::{EncodeError, FrameSink, Result, StreamSpec, WriterBackend};

/// Encodes through an `ffmpeg` executable.
#[derive(Clone, Debug)]
pub struct FfmpegBackend {
    binary: PathBuf,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegBackend {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, codec: &str, path: &Path, spec: StreamSpec) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("-s:v")
            .arg(format!("{}x{}", spec.width, spec.height))
            .arg("-r")
            .arg(spec.fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-an")
            // yuv420p needs even dimensions
            .arg("-vf")
            .arg("pad=ceil(iw/2)*2:ceil(ih/2)*2")
            .arg("-c:v")
            .arg(codec)
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

impl WriterBackend for FfmpegBackend {
    fn open(&self, codec: &str, path: &Path, spec: StreamSpec) -> Result<Box<dyn FrameSink>> {
        let mut child = self.command(codec, path, spec).spawn().map_err(|error| {
            if error.kind() == ErrorKind::NotFound {
                EncodeError::writer(
                    codec,
                    format!(
                        "{} was not found on PATH. Install ffmpeg or set encoder.ffmpeg_binary",
                        self.binary.display()
                    ),
                )
            } else {
                EncodeError::writer(codec, format!("failed to spawn ffmpeg: {error}"))
            }
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EncodeError::writer(codec, "failed to capture ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EncodeError::writer(codec, "failed to capture ffmpeg stderr"))?;

        // Drain stderr so ffmpeg never blocks on a full pipe.
        let stderr = std::thread::spawn(move || {
            let mut output = String::new();
            let mut stderr = stderr;
            if let Err(err) = stderr.read_to_string(&mut output) {
                output = format!("<failed to read ffmpeg stderr: {err}>");
            }
            output
        });

        tracing::debug!(codec, path = %path.display(), pid = child.id(), "ffmpeg writer started");
        Ok(Box::new(FfmpegSink {
            codec: codec.to_string(),
            frame_len: spec.frame_len(),
            child,
            stdin: Some(stdin),
            stderr: Some(stderr),
        }))
    }
}

struct FfmpegSink {
    codec: String,
    frame_len: usize,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<String>>,
}

impl FfmpegSink {
    fn stderr_output(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, rgba: &[u8]) -> Result<()> {
        if rgba.len() != self.frame_len {
            return Err(EncodeError::writer(
                &self.codec,
                format!("frame is {} bytes, expected {}", rgba.len(), self.frame_len),
            ));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EncodeError::writer(&self.codec, "writer already finished"))?;
        // A broken pipe means ffmpeg rejected the stream; finish() reports why.
        stdin
            .write_all(rgba)
            .map_err(|e| EncodeError::writer(&self.codec, format!("failed to write frame: {e}")))
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        if let Some(mut stdin) = self.stdin.take() {
            // Ignore flush errors here; the exit status is authoritative.
            let _ = stdin.flush();
        }
        let status = self
            .child
            .wait()
            .map_err(|e| EncodeError::writer(&self.codec, format!("failed waiting for ffmpeg: {e}")))?;
        let stderr = self.stderr_output();

        if !status.success() {
            return Err(EncodeError::writer(
                &self.codec,
                format!("ffmpeg failed with status {status}: {stderr}"),
            ));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.stdin.take().is_some() {
            // Abandoned before finish.
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
