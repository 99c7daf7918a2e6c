//! Flowreplay Encoder
//!
//! Turns an ordered sequence of equally sized RGBA frames into a video file.
//!
//! Codec availability varies between machines, so the encoder negotiates:
//! each configured candidate is tried against a throwaway one-frame video and
//! the first one that writes successfully is used. The real output is written
//! to a hidden partial file, verified and renamed into place, so a failed
//! encode never leaves a visible file behind.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use flowreplay_encoder::{FfmpegBackend, VideoEncoder};
//!
//! let encoder = VideoEncoder::new(Arc::new(FfmpegBackend::default()), vec![]);
//! let video = encoder.encode(&frames, 15, "videos/session_42_real_browser.mp4".as_ref())?;
//! println!("{} via {}", video.path.display(), video.codec);
//! ```

mod backend;
mod encoder;
mod error;
mod ffmpeg;
pub mod testing;

pub use backend::{FrameSink, StreamSpec, WriterBackend};
pub use encoder::{EncodedVideo, VideoEncoder, DEFAULT_CODEC_CANDIDATES};
pub use error::{EncodeError, Result};
pub use ffmpeg::FfmpegBackend;
