//! Flowreplay Recorder
//!
//! Data model and replay primitives for recorded pointer/scroll sessions.
//!
//! # Features
//!
//! - `RecordedEvent` / `RecordedSession` in the tracker's wire format
//! - `EventTimeline` - offset index answering "which event is active at t"
//! - `TrailBuffer` - bounded cursor history for overlay rendering
//! - `CapturedFrame` / `FrameSequence` - RGBA frames produced during replay
//! - `SessionRepository` - read-only access to stored sessions
//!
//! # Example
//!
//! ```ignore
//! use flowreplay_recorder::{EventTimeline, JsonSessionStore, SessionRepository};
//!
//! let store = JsonSessionStore::new("data/sessions");
//! let session = store.load_session(42)?;
//! let timeline = EventTimeline::build(session.events)?;
//!
//! for frame in 0..timeline.total_frames(15) {
//!     let t = frame as f64 / 15.0;
//!     if let Some(entry) = timeline.active_event_at(t) {
//!         // Replay entry.event...
//!     }
//! }
//! ```

pub mod capture;
mod error;
pub mod frame;
pub mod replay;
pub mod repository;
pub mod summary;

pub use capture::{EventKind, RecordedEvent, RecordedSession, ScrollPayload, SessionId};
pub use error::{PayloadError, RepositoryError, TimelineError};
pub use frame::{CapturedFrame, FrameSequence, FALLBACK_FRAME_HEIGHT, FALLBACK_FRAME_WIDTH};
pub use replay::{
    EventTimeline, FramePacer, TimelineEntry, TrailBuffer, TrailSample, DEFAULT_TRAIL_CAPACITY,
};
pub use repository::{JsonSessionStore, MemorySessionStore, SessionRepository};
pub use summary::SessionSummary;
