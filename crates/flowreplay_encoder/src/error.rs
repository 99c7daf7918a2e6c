//! Encoder errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while negotiating a codec or writing a video.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Every candidate failed the trial write.
    #[error("no usable video codec (tried: {})", .tried.join(", "))]
    CodecUnavailable { tried: Vec<String> },

    /// The writer reported success but the output is missing or empty.
    #[error("encoded video at {} failed verification: {reason}", .path.display())]
    Verification { path: PathBuf, reason: String },

    #[error("frame {index} is {actual:?}, expected {expected:?}")]
    FrameSizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("no frames to encode")]
    EmptySequence,

    /// A writer backend failed to open, accept a frame or finish.
    #[error("{codec} writer failed: {message}")]
    Writer { codec: String, message: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EncodeError {
    pub fn writer(codec: &str, message: impl Into<String>) -> Self {
        Self::Writer {
            codec: codec.to_string(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for encoder operations
pub type Result<T> = std::result::Result<T, EncodeError>;
