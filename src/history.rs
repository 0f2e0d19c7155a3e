//! Rolling history of nostril temperatures for one capture
//! session.
//!
//! The buffer is counter driven rather than a ring: every
//! measured sample advances a counter and is inserted at the
//! counter's position, so the first cycle simply appends. When
//! the counter passes the capacity it wraps to zero and a
//! sentinel `0.0` is pushed at the head; the next cycle then
//! writes in front of the previous one. Nothing is ever evicted,
//! the buffer keeps growing until [`HistoryBuffer::clear`].
//!
//! Frames without a usable detection push a sentinel at the
//! head without touching the counter.
//!
//! Sentinels are tracked by position, so a genuine `0.0`
//! measurement is still counted by [`HistoryBuffer::stats`].

use std::collections::VecDeque;

use serde::{Serialize, Serializer};

use crate::{config::DEFAULT_HISTORY_CAPACITY, stats::Stats};

pub const SENTINEL: f64 = 0.0;

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryBuffer {
    /// `None` marks a sentinel slot.
    samples: VecDeque<Option<f64>>,
    capacity: usize,
    counter: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        HistoryBuffer {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
            counter: 0,
        }
    }

    /// Record one frame: `Some(celsius)` for a measurement,
    /// `None` when nothing usable was detected.
    pub fn record(&mut self, sample: Option<f64>) {
        match sample {
            Some(celsius) => self.record_measurement(celsius),
            None => self.record_missing(),
        }
    }

    pub fn record_measurement(&mut self, celsius: f64) {
        self.counter += 1;
        if self.counter == self.capacity + 1 {
            self.counter = 0;
            self.samples.push_front(None);
        }
        let at = self.counter.min(self.samples.len());
        self.samples.insert(at, Some(celsius));
    }

    pub fn record_missing(&mut self) {
        self.samples.push_front(None);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Measured samples recorded in the current cycle.
    pub fn counter(&self) -> usize {
        self.counter
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Last sample in sequence order, sentinels included.
    /// Once the counter has wrapped this is no longer the most
    /// recent measurement, since later cycles write at the head.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|s| s.unwrap_or(SENTINEL))
    }

    /// Samples in sequence order, sentinels as `0.0`.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.unwrap_or(SENTINEL))
    }

    /// Number of sentinel slots.
    pub fn sentinels(&self) -> usize {
        self.samples.iter().filter(|s| s.is_none()).count()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// Summary over the measured samples; sentinel slots are
    /// skipped even though they read as `0.0`.
    pub fn stats(&self) -> Stats {
        self.samples.iter().flatten().copied().collect()
    }

    /// End of session: drop every sample and reset the counter.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.counter = 0;
    }
}

impl Serialize for HistoryBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
