//! Trigger endpoint: run one generation and shape the response.

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use flowreplay_recorder::SessionId;

use crate::error::ReplayError;
use crate::orchestrator::{ReplayOrchestrator, ReplayResult};

/// Response body of a generation request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TriggerBody {
    VideoGenerated {
        session_id: SessionId,
        video_path: String,
        #[serde(rename = "type")]
        kind: String,
        video_duration_seconds: f64,
        session_duration_seconds: f64,
    },
    Error {
        message: String,
    },
}

/// A structured response plus its HTTP-style status code.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerResponse {
    pub status_code: u16,
    pub body: TriggerBody,
}

impl TriggerResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.body).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "message": e.to_string() })
        })
    }
}

impl From<&ReplayResult> for TriggerResponse {
    fn from(result: &ReplayResult) -> Self {
        Self {
            status_code: 200,
            body: TriggerBody::VideoGenerated {
                session_id: result.session_id,
                video_path: result.public_path.clone(),
                kind: "real_browser".to_string(),
                video_duration_seconds: result.video_duration_seconds,
                session_duration_seconds: result.session_duration_seconds,
            },
        }
    }
}

impl From<&ReplayError> for TriggerResponse {
    fn from(error: &ReplayError) -> Self {
        let message = match error {
            ReplayError::EmptySession | ReplayError::SessionNotFound(_) => error.to_string(),
            other => format!("Failed to generate real browser video: {other}"),
        };
        Self {
            status_code: error.status_code(),
            body: TriggerBody::Error { message },
        }
    }
}

/// Generate the session's video and report the outcome. Never fails;
/// errors become `status: "error"` responses.
pub fn trigger_generation(
    orchestrator: &ReplayOrchestrator,
    session_id: SessionId,
    cancel: &CancellationToken,
) -> TriggerResponse {
    match orchestrator.generate(session_id, cancel) {
        Ok(result) => TriggerResponse::from(&result),
        Err(error) => TriggerResponse::from(&error),
    }
}
