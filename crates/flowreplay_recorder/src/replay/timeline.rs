//! Event timeline for frame-by-frame replay.
//!
//! Sorts a session's events by absolute time and answers which event is
//! active at a given simulated time. An event stays active until the next
//! event's offset is reached.

use crate::capture::RecordedEvent;
use crate::error::TimelineError;

/// Sessions shorter than this are stretched so the video is watchable.
const MIN_SPAN_SECS: f64 = 0.1;
const MIN_DURATION_SECS: f64 = 0.5;
const PER_EVENT_SECS: f64 = 0.1;
const SINGLE_EVENT_DURATION_SECS: f64 = 1.0;

/// An event positioned on the timeline.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineEntry {
    /// Seconds since the first event.
    pub offset: f64,
    /// Position in the sorted sequence.
    pub index: usize,
    pub event: RecordedEvent,
}

/// Time-ordered index over a non-empty list of events.
#[derive(Clone, Debug)]
pub struct EventTimeline {
    entries: Vec<TimelineEntry>,
}

impl EventTimeline {
    /// Build a timeline from events in any order.
    ///
    /// Events with equal timestamps keep their input order.
    pub fn build(events: impl IntoIterator<Item = RecordedEvent>) -> Result<Self, TimelineError> {
        let mut events: Vec<RecordedEvent> = events.into_iter().collect();
        if events.is_empty() {
            return Err(TimelineError::EmptySession);
        }
        events.sort_by_key(|e| e.timestamp_ms);

        let first = events[0].timestamp_ms;
        let entries = events
            .into_iter()
            .enumerate()
            .map(|(index, event)| TimelineEntry {
                offset: (event.timestamp_ms - first) as f64 / 1000.0,
                index,
                event,
            })
            .collect();

        Ok(Self { entries })
    }

    /// Number of events. Never zero.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    /// Actual time between the first and last event in seconds.
    pub fn span(&self) -> f64 {
        self.entries.last().map(|e| e.offset).unwrap_or_default()
    }

    /// Duration of the replay in seconds.
    ///
    /// One event replays for a fixed second; near-zero spans are stretched
    /// to `max(0.5, count * 0.1)`.
    pub fn total_duration(&self) -> f64 {
        if self.entries.len() == 1 {
            return SINGLE_EVENT_DURATION_SECS;
        }
        let span = self.span();
        if span < MIN_SPAN_SECS {
            return MIN_DURATION_SECS.max(self.entries.len() as f64 * PER_EVENT_SECS);
        }
        span
    }

    /// `floor(total_duration * fps)`.
    pub fn total_frames(&self, fps: u32) -> u64 {
        (self.total_duration() * fps as f64).floor() as u64
    }

    /// The event with the greatest offset not after `t`, or `None` when `t`
    /// precedes the first event.
    pub fn active_event_at(&self, t: f64) -> Option<&TimelineEntry> {
        let reached = self.entries.partition_point(|e| e.offset <= t);
        reached.checked_sub(1).map(|i| &self.entries[i])
    }
}
