//! Export statistics tracking.
//!
//! Thread-safe counters shared between an exporter's producers, its worker and
//! the status reporter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ExportCounter;

/// Thread-safe export statistics tracker.
///
/// Every counter is initialized to zero on creation and can be bumped from any
/// task without locking.
pub struct ExportStats {
    counters: HashMap<ExportCounter, AtomicUsize>,
}

impl ExportStats {
    pub fn new() -> Self {
        let mut counters = HashMap::new();
        for counter in ExportCounter::iter() {
            counters.insert(counter, AtomicUsize::new(0));
        }

        ExportStats { counters }
    }

    /// Increment a counter.
    pub fn increment(&self, counter: ExportCounter) {
        self.add(counter, 1);
    }

    /// Add `n` to a counter.
    pub fn add(&self, counter: ExportCounter, n: usize) {
        if let Some(c) = self.counters.get(&counter) {
            c.fetch_add(n, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter {:?} which is not in the map. \
                 This indicates a bug in ExportStats initialization.",
                counter
            );
        }
    }

    /// Get the value of a counter.
    pub fn get(&self, counter: ExportCounter) -> usize {
        self.counters
            .get(&counter)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Snapshot of every counter, in declaration order.
    pub fn snapshot(&self) -> Vec<(ExportCounter, usize)> {
        ExportCounter::iter().map(|c| (c, self.get(c))).collect()
    }
}

impl Default for ExportStats {
    fn default() -> Self {
        Self::new()
    }
}
