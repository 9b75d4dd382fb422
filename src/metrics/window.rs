//! Bounded rolling window of recent samples.
//!
//! The window is a fixed-capacity FIFO: once full, inserting a new sample
//! evicts the oldest. Ordering is arrival order; out-of-order timestamps
//! are accepted and kept in arrival order.
//!
//! All reads hand out snapshot copies. Statistics are computed on those
//! copies outside the lock, so O(n) statistics work never blocks ingestion.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::metrics::stats::{StatsSnapshot, compute_stats};
use crate::sample::{Sample, epoch_now};

// ============================================================================
// SampleAggregator
// ============================================================================

/// Thread-safe bounded window of recent samples with derived statistics.
///
/// # Thread Safety
///
/// `SampleAggregator` is `Send + Sync`. Window access is mutually
/// exclusive; one ingestion path writes while any number of tasks read
/// snapshots concurrently.
#[derive(Debug)]
pub struct SampleAggregator {
    /// Maximum number of retained samples.
    capacity: usize,
    /// Retained samples in arrival order, oldest first.
    window: Mutex<VecDeque<Sample>>,
}

impl SampleAggregator {
    /// Creates an aggregator retaining at most `capacity` samples
    /// (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Inserts a sample, evicting the oldest when the window is full.
    ///
    /// O(1) amortized.
    pub fn add(&self, sample: Sample) {
        let mut window = self.window.lock();
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(sample);
    }

    /// Snapshot copy of all retained samples with
    /// `timestamp >= now - minutes * 60`.
    #[must_use]
    pub fn recent(&self, minutes: u64) -> Vec<Sample> {
        let cutoff = epoch_now() - (minutes * 60) as f64;
        let window = self.window.lock();
        window
            .iter()
            .filter(|sample| sample.timestamp >= cutoff)
            .cloned()
            .collect()
    }

    /// Snapshot copy of the full retained window, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<Sample> {
        self.window.lock().iter().cloned().collect()
    }

    /// Number of retained samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.window.lock().len()
    }

    /// Returns `true` if the window holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.lock().is_empty()
    }

    /// Maximum number of retained samples.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Empties the window.
    ///
    /// Memory-only; clearing the durable log is the facade's job.
    pub fn clear(&self) {
        self.window.lock().clear();
    }

    /// Statistics over the last `minutes` minutes.
    ///
    /// Takes a snapshot under the lock, computes outside it.
    #[must_use]
    pub fn recent_stats(&self, minutes: u64) -> Option<StatsSnapshot> {
        let samples = self.recent(minutes);
        compute_stats(&samples)
    }

    /// Statistics over the full retained window.
    #[must_use]
    pub fn overall_stats(&self) -> Option<StatsSnapshot> {
        let samples = self.all();
        compute_stats(&samples)
    }
}

// ============================================================================
// Tests
// ============================================================================
