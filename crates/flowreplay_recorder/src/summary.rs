//! Per-session interaction statistics.

use serde::Serialize;

use crate::capture::{EventKind, RecordedSession, SessionId};

/// Aggregate counts shown next to a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub url: Option<String>,
    pub event_count: usize,
    pub clicks: usize,
    /// Share of events that are pointer moves, rounded to one decimal.
    pub move_percentage: f64,
    /// Deepest scroll reached, from the scroll payload, capped at 100.
    pub max_scroll_percent: f64,
}

impl SessionSummary {
    pub fn from_session(session: &RecordedSession) -> Self {
        let total = session.events.len();
        let clicks = session
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Click)
            .count();
        let moves = session
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Move)
            .count();

        let move_percentage = if total > 0 {
            ((moves as f64 / total as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        };

        let max_scroll_percent = session
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Scroll)
            .filter_map(|e| e.scroll_payload().ok())
            .map(|p| p.percent())
            .fold(0.0_f64, f64::max)
            .min(100.0);

        Self {
            session_id: session.id,
            url: session.target_url().map(str::to_string),
            event_count: total,
            clicks,
            move_percentage,
            max_scroll_percent,
        }
    }
}
