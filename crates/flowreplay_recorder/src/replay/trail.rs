//! Bounded cursor history used to draw the fading mouse trail.

use std::collections::VecDeque;

use crate::capture::EventKind;

/// Default number of samples kept in the trail.
pub const DEFAULT_TRAIL_CAPACITY: usize = 30;

/// A cursor position sampled once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailSample {
    pub x: i64,
    pub y: i64,
    pub kind: EventKind,
}

/// FIFO of recent samples; the oldest sample is evicted first.
#[derive(Clone, Debug)]
pub struct TrailBuffer {
    samples: VecDeque<TrailSample>,
    capacity: usize,
}

impl TrailBuffer {
    /// Create a trail holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: TrailSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TrailSample> + ExactSizeIterator {
        self.samples.iter()
    }

    /// The most recent sample.
    pub fn latest(&self) -> Option<&TrailSample> {
        self.samples.back()
    }

    /// The sample pushed just before the latest one.
    pub fn previous(&self) -> Option<&TrailSample> {
        self.samples.len().checked_sub(2).and_then(|i| self.samples.get(i))
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIL_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: i64) -> TrailSample {
        TrailSample {
            x: i,
            y: i * 2,
            kind: EventKind::Move,
        }
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut trail = TrailBuffer::default();
        for i in 0..500 {
            trail.push(sample(i));
            assert!(trail.len() <= DEFAULT_TRAIL_CAPACITY);
        }
        assert_eq!(trail.len(), 30);
    }

    #[test]
    fn evicts_oldest_first() {
        let mut trail = TrailBuffer::new(3);
        for i in 0..5 {
            trail.push(sample(i));
        }
        let xs: Vec<i64> = trail.iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![2, 3, 4]);
        assert_eq!(trail.latest().unwrap().x, 4);
        assert_eq!(trail.previous().unwrap().x, 3);
    }

    #[test]
    fn previous_needs_two_samples() {
        let mut trail = TrailBuffer::new(0);
        assert_eq!(trail.capacity(), 1);
        trail.push(sample(1));
        assert!(trail.previous().is_none());
        trail.clear();
        assert!(trail.is_empty());
    }
}
