//! Replay primitives for recorded sessions.
//!
//! This module provides:
//! - `EventTimeline` - Offset index over a session's events
//! - `TrailBuffer` - Bounded cursor history rendered as a fading trail
//! - `FramePacer` - Soft wall-clock pacing for frame-by-frame replay

mod clock;
mod timeline;
mod trail;

pub use clock::FramePacer;
pub use timeline::{EventTimeline, TimelineEntry};
pub use trail::{TrailBuffer, TrailSample, DEFAULT_TRAIL_CAPACITY};
