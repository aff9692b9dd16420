//! Per-second hit counts and the bounded window that holds them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{FailRunError, Result};

/// Hits observed during one whole UTC second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measurement {
    /// Unix timestamp, truncated to the second.
    pub utc_unix: i64,
    pub rps: u64,
}

impl Measurement {
    pub fn empty(utc_unix: i64) -> Self {
        Self { utc_unix, rps: 0 }
    }
}

/// Oldest-first history of at most `max_history` measurements.
///
/// The window is never empty: it starts with one open bucket and every tick
/// opens a new one. Only the newest bucket is ever incremented.
#[derive(Debug, Clone)]
pub struct MeasurementWindow {
    buckets: VecDeque<Measurement>,
    max_history: usize,
}

impl MeasurementWindow {
    /// A window holding a single zero-count bucket for `utc_unix`.
    /// `max_history` is clamped to at least 1.
    pub fn new(utc_unix: i64, max_history: usize) -> Self {
        let max_history = max_history.max(1);
        let mut buckets = VecDeque::new();
        buckets.push_back(Measurement::empty(utc_unix));
        Self { buckets, max_history }
    }

    /// Count one hit in the current bucket.
    pub fn hit(&mut self) {
        if let Some(current) = self.buckets.back_mut() {
            current.rps = current.rps.saturating_add(1);
        }
    }

    /// Close the current bucket and open a new one for `utc_unix`, dropping
    /// the oldest bucket once the window is full.
    pub fn tick(&mut self, utc_unix: i64) {
        self.buckets.push_back(Measurement::empty(utc_unix));
        while self.buckets.len() > self.max_history {
            self.buckets.pop_front();
        }
    }

    /// Copy of every bucket, oldest first.
    pub fn snapshot(&self) -> Vec<Measurement> {
        self.buckets.iter().copied().collect()
    }

    pub fn current(&self) -> Option<&Measurement> {
        self.buckets.back()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

/// Encode a snapshot as the JSON array served to clients.
pub fn encode_snapshot(snapshot: &[Measurement]) -> Result<Vec<u8>> {
    serde_json::to_vec(snapshot).map_err(|e| FailRunError::Serialization(e.to_string()))
}
