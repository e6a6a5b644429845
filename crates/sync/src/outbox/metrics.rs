use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters over the operation lifecycle, recorded by the policy layer and
/// the worker sweep.
#[derive(Debug, Default)]
pub struct OutboxMetrics {
    pub total_enqueued: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_failed: AtomicU64,
    pub total_permanent_failed: AtomicU64,
    pub total_requeued: AtomicU64,
    pub total_pruned: AtomicU64,
}

impl OutboxMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueue(&self) {
        self.total_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completion(&self) {
        self.total_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.total_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_permanent_failure(&self) {
        self.total_permanent_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_requeues(&self, count: u64) {
        self.total_requeued.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_prunes(&self, count: u64) {
        self.total_pruned.fetch_add(count, Ordering::Relaxed);
    }

    /// Consistent point-in-time copy of all counters.
    pub fn snapshot(&self) -> OutboxMetricsSnapshot {
        OutboxMetricsSnapshot {
            total_enqueued: self.total_enqueued.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_permanent_failed: self.total_permanent_failed.load(Ordering::Relaxed),
            total_requeued: self.total_requeued.load(Ordering::Relaxed),
            total_pruned: self.total_pruned.load(Ordering::Relaxed),
        }
    }
}

/// Plain-data view of [`OutboxMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMetricsSnapshot {
    pub total_enqueued: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_permanent_failed: u64,
    pub total_requeued: u64,
    pub total_pruned: u64,
}

#[cfg(test)]
mod tests {
    //! Unit tests for outbox::metrics.
    use super::*;

    /// Validates `OutboxMetrics::snapshot` behavior for the counter
    /// aggregation scenario.
    ///
    /// Assertions:
    /// - Confirms each recorded event shows up in the snapshot.
    #[test]
    fn test_snapshot_reflects_counters() {
        let metrics = OutboxMetrics::new();
        metrics.record_enqueue();
        metrics.record_enqueue();
        metrics.record_completion();
        metrics.record_failure();
        metrics.record_permanent_failure();
        metrics.record_requeues(3);
        metrics.record_prunes(2);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_enqueued, 2);
        assert_eq!(snap.total_completed, 1);
        assert_eq!(snap.total_failed, 1);
        assert_eq!(snap.total_permanent_failed, 1);
        assert_eq!(snap.total_requeued, 3);
        assert_eq!(snap.total_pruned, 2);
    }
}
