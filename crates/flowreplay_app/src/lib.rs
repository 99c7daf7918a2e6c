//! Flowreplay Application
//!
//! Session replay video generation: loads a recorded session, replays it in
//! a real browser frame by frame, composites a cursor overlay onto every
//! capture and encodes the result.
//!
//! # Example
//!
//! ```ignore
//! use flowreplay_app::{trigger_generation, AppConfig, ReplayOrchestrator};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = AppConfig::load_or_default(None, ".".as_ref())?;
//! let orchestrator = ReplayOrchestrator::from_config(&config);
//! let response = trigger_generation(&orchestrator, 42, &CancellationToken::new());
//! println!("{}", response.to_json());
//! ```

pub mod compositor;
pub mod config;
mod error;
pub mod orchestrator;
pub mod store;
pub mod trigger;

use std::sync::Arc;

use flowreplay_browser::WebDriverLauncher;
use flowreplay_encoder::{FfmpegBackend, VideoEncoder};
use flowreplay_recorder::JsonSessionStore;

pub use compositor::{paint_overlay, FrameCompositor, OverlayInfo};
pub use config::AppConfig;
pub use error::{EventReplayError, ReplayError, Result, StoreError};
pub use orchestrator::{ReplayOrchestrator, ReplayOutcome, ReplayResult, ReplaySettings, ReplayState};
pub use store::{VideoResponse, VideoStore};
pub use trigger::{trigger_generation, TriggerBody, TriggerResponse};

impl ReplayOrchestrator {
    /// Production wiring: JSON session files, WebDriver browser and ffmpeg.
    pub fn from_config(config: &AppConfig) -> Self {
        let encoder = VideoEncoder::new(
            Arc::new(FfmpegBackend::new(&config.encoder.ffmpeg_binary)),
            config.encoder.candidates.clone(),
        );
        Self::new(
            Arc::new(JsonSessionStore::new(&config.storage.sessions_dir)),
            Arc::new(WebDriverLauncher::new(config.browser.webdriver())),
            encoder,
            video_store(config),
            ReplaySettings::from_config(config),
        )
    }
}

/// The video store described by `config`.
pub fn video_store(config: &AppConfig) -> VideoStore {
    VideoStore::new(&config.storage.videos_dir, config.storage.public_prefix.clone())
}
