//! Operation counters
//!
//! - Counters only, monotonic
//! - Relaxed atomics; values are exact once operations have returned

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-model counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Successful saves
    saves: AtomicU64,
    /// Saves that failed validation or commit
    saves_rejected: AtomicU64,
    /// Successful deletes
    deletes: AtomicU64,
    /// Accessor lookups executed
    lookups: AtomicU64,
    /// Records returned by lookups
    records_returned: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_saves(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_saves_rejected(&self) {
        self.saves_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_deletes(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one lookup returning `records` records
    pub fn record_lookup(&self, records: u64) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.records_returned.fetch_add(records, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            saves: self.saves.load(Ordering::Relaxed),
            saves_rejected: self.saves_rejected.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            records_returned: self.records_returned.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub saves: u64,
    pub saves_rejected: u64,
    pub deletes: u64,
    pub lookups: u64,
    pub records_returned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.increment_saves();
        metrics.increment_saves();
        metrics.increment_saves_rejected();
        metrics.record_lookup(3);
        metrics.record_lookup(0);

        let snap = metrics.snapshot();
        assert_eq!(snap.saves, 2);
        assert_eq!(snap.saves_rejected, 1);
        assert_eq!(snap.lookups, 2);
        assert_eq!(snap.records_returned, 3);
        assert_eq!(snap.deletes, 0);
    }
}
