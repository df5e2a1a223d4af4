//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::DispatchOutcome;

/// Per-outcome counters of the typed dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    completed: AtomicU64,
    timed_out: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one terminal state
    pub fn record(&self, outcome: &DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Completed { .. } => &self.completed,
            DispatchOutcome::TimedOut { .. } => &self.timed_out,
            DispatchOutcome::Rejected(_) => &self.rejected,
            DispatchOutcome::Dropped { .. } => &self.dropped,
            DispatchOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn timed_out(&self) -> u64 {
        self.timed_out.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            completed: self.completed(),
            timed_out: self.timed_out(),
            rejected: self.rejected(),
            dropped: self.dropped(),
            failed: self.failed(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub completed: u64,
    pub timed_out: u64,
    pub rejected: u64,
    pub dropped: u64,
    pub failed: u64,
}

impl MetricsSnapshot {
    pub fn total(&self) -> u64 {
        self.completed + self.timed_out + self.rejected + self.dropped + self.failed
    }
}
