//! Wall-clock pacing for frame-by-frame replay.
//!
//! Replay frames are addressed by simulated time (`index / fps`). The pacer
//! keeps the live browser roughly in step with that timeline so page
//! animations look right in the captured frames. It never skips frames and
//! never fails; falling behind simply means no sleep.

use std::time::{Duration, Instant};

/// Soft frame pacer.
#[derive(Debug)]
pub struct FramePacer {
    /// Wall time per frame.
    interval: Duration,
    /// When the first frame started.
    started: Option<Instant>,
    /// Disabled pacers never sleep (tests, offline rendering).
    enabled: bool,
}

impl FramePacer {
    /// Create a pacer for the given frame rate.
    pub fn new(fps: u32, enabled: bool) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            started: None,
            enabled,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mark the start of the replay loop.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Wall time elapsed since `start`.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Wall-clock offset at which `frame_index` is due.
    pub fn due_at(&self, frame_index: u64) -> Duration {
        self.interval.saturating_mul(frame_index.min(u32::MAX as u64) as u32)
    }

    /// How long to wait before `frame_index` is due, if at all.
    pub fn remaining_until(&self, frame_index: u64) -> Option<Duration> {
        self.due_at(frame_index).checked_sub(self.elapsed()).filter(|d| !d.is_zero())
    }

    /// Sleep until `frame_index` is due.
    pub fn wait_for(&self, frame_index: u64) {
        if !self.enabled {
            return;
        }
        if let Some(wait) = self.remaining_until(frame_index) {
            std::thread::sleep(wait);
        }
    }

    /// Short pause letting the page react to a dispatched action.
    pub fn settle(&self, duration: Duration) {
        if self.enabled && !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_fps() {
        let pacer = FramePacer::new(15, false);
        assert!((pacer.interval().as_secs_f64() - 1.0 / 15.0).abs() < 1e-9);
        assert!(!pacer.is_enabled());
    }

    #[test]
    fn zero_fps_is_treated_as_one() {
        let pacer = FramePacer::new(0, false);
        assert_eq!(pacer.interval(), Duration::from_secs(1));
    }

    #[test]
    fn due_times_scale_with_index() {
        let pacer = FramePacer::new(10, false);
        assert_eq!(pacer.due_at(0), Duration::ZERO);
        assert_eq!(pacer.due_at(25), Duration::from_millis(2_500));
    }

    #[test]
    fn nothing_remaining_for_past_frames() {
        let mut pacer = FramePacer::new(1_000, true);
        pacer.start();
        std::thread::sleep(Duration::from_millis(5));
        assert!(pacer.remaining_until(1).is_none());
    }

    #[test]
    fn disabled_pacer_never_sleeps() {
        let mut pacer = FramePacer::new(1, false);
        pacer.start();
        let before = Instant::now();
        pacer.wait_for(10);
        pacer.settle(Duration::from_secs(5));
        assert!(before.elapsed() < Duration::from_secs(1));
    }
}
