//! Recorded interaction events.
//!
//! The serialized form matches what the page tracker posts:
//! `{"type": "click", "timestamp": 1719832000123, "x": 10, "y": 20, "data": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::PayloadError;

/// Identifier of a recorded session.
pub type SessionId = u64;

/// Kind of a recorded interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[serde(rename = "mousemove", alias = "move")]
    Move,
    Click,
    Scroll,
    #[serde(other)]
    Other,
}

impl EventKind {
    /// Name shown in overlays and logs.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Move => "mousemove",
            EventKind::Click => "click",
            EventKind::Scroll => "scroll",
            EventKind::Other => "other",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single recorded interaction. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Absolute time in milliseconds since the Unix epoch.
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
    #[serde(default, deserialize_with = "deserialize_coord")]
    pub x: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_coord")]
    pub y: Option<i64>,
    /// Opaque structured data; for scroll events `{scrollY, pageHeight}`.
    #[serde(default, rename = "data", skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Coordinates arrive as integers from pointer events but as fractional
/// numbers from some trackers.
fn deserialize_coord<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).map(|v| v.round() as i64))
}

/// Scroll payload recorded alongside scroll events.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ScrollPayload {
    #[serde(rename = "scrollY")]
    pub scroll_y: f64,
    #[serde(rename = "pageHeight", default)]
    pub page_height: Option<f64>,
}

impl ScrollPayload {
    /// Scroll depth as a percentage of the page height, rounded to two
    /// decimals. This is the canonical scroll-percentage derivation.
    pub fn percent(&self) -> f64 {
        let height = self.page_height.unwrap_or(1.0).max(1.0);
        ((self.scroll_y / height) * 100.0 * 100.0).round() / 100.0
    }
}

impl RecordedEvent {
    pub fn new(kind: EventKind, timestamp_ms: i64) -> Self {
        Self {
            kind,
            timestamp_ms,
            x: None,
            y: None,
            payload: None,
        }
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Recorded coordinates with missing values read as zero.
    pub fn position(&self) -> (i64, i64) {
        (self.x.unwrap_or(0), self.y.unwrap_or(0))
    }

    /// Original wall-clock time of the event.
    pub fn wall_clock(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }

    /// Decode the scroll payload.
    ///
    /// The payload may be stored inline or as a JSON-encoded string.
    pub fn scroll_payload(&self) -> Result<ScrollPayload, PayloadError> {
        match &self.payload {
            None | Some(Value::Null) => Err(PayloadError::Missing),
            Some(Value::String(raw)) => Ok(serde_json::from_str(raw)?),
            Some(value) => Ok(ScrollPayload::deserialize(value)?),
        }
    }
}

/// A stored session: the page it was recorded on plus its events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedSession {
    pub id: SessionId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub events: Vec<RecordedEvent>,
}

impl RecordedSession {
    /// The recorded page URL, if a usable one was captured.
    pub fn target_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && *url != "unknown")
    }
}
