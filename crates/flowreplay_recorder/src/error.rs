use std::path::PathBuf;

use thiserror::Error;

use crate::capture::SessionId;

/// Errors raised while indexing a session's events.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("No events found for this session")]
    EmptySession,
}

/// Errors raised by session repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised while decoding an event's structured payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Event has no payload")]
    Missing,

    #[error("Malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
}
