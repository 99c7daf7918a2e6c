//! Replay generation errors

use std::path::PathBuf;

use thiserror::Error;

use flowreplay_browser::BrowserError;
use flowreplay_encoder::EncodeError;
use flowreplay_recorder::{PayloadError, RepositoryError, SessionId, TimelineError};

/// Terminal failure of one replay job.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("No events found for this session")]
    EmptySession,

    #[error("Failed to load session: {0}")]
    Repository(#[source] RepositoryError),

    #[error("Browser failure: {0}")]
    Browser(#[from] BrowserError),

    #[error("No frames captured")]
    NoFrames,

    #[error("Video encoding failed: {0}")]
    Encode(#[from] EncodeError),

    #[error("Replay cancelled")]
    Cancelled,

    #[error("Replay exceeded its time limit of {0:?}")]
    TimedOut(std::time::Duration),
}

impl From<RepositoryError> for ReplayError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::SessionNotFound(id) => ReplayError::SessionNotFound(id),
            other => ReplayError::Repository(other),
        }
    }
}

impl From<TimelineError> for ReplayError {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::EmptySession => ReplayError::EmptySession,
        }
    }
}

impl ReplayError {
    /// HTTP-style status for the trigger response.
    pub fn status_code(&self) -> u16 {
        match self {
            ReplayError::SessionNotFound(_) => 404,
            ReplayError::EmptySession => 400,
            _ => 500,
        }
    }
}

/// Failure to replay a single event. Logged and skipped.
#[derive(Debug, Error)]
pub enum EventReplayError {
    #[error("invalid scroll payload: {0}")]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}

/// Errors from the video store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Video not found")]
    NotFound,

    #[error("Requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for replay generation
pub type Result<T> = std::result::Result<T, ReplayError>;
