//! Bounded price history.
//!
//! Time-ordered buffer of the samples produced by the aggregator,
//! feeding both the round engine's observers and the market analyst.
//! Overflow silently drops the oldest entry — never an error.

use std::collections::VecDeque;

use crate::types::PriceSample;

/// Default number of samples retained (matches the chart window).
pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct PriceHistory {
    buf: VecDeque<PriceSample>,
    capacity: usize,
}

impl PriceHistory {
    /// History bounded at `capacity` samples. A zero capacity is clamped
    /// to one so `append` always retains the newest sample.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest entry once full.
    /// Insertion order is chronological order.
    pub fn append(&mut self, sample: PriceSample) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(sample);
    }

    /// Snapshot of the series, oldest first.
    pub fn as_series(&self) -> Vec<PriceSample> {
        self.buf.iter().copied().collect()
    }

    /// The most recent sample, if any.
    pub fn latest(&self) -> Option<PriceSample> {
        self.buf.back().copied()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for PriceHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
