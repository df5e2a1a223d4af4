//! Report lane metrics

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{ReportKind, ReportOutcome};

/// Counters of one report lane
#[derive(Debug)]
pub struct ReportMetrics {
    kind: ReportKind,
    ticks: AtomicU64,
    published: AtomicU64,
    empty: AtomicU64,
    no_connector: AtomicU64,
    failed: AtomicU64,
    admission_timeouts: AtomicU64,
}

impl ReportMetrics {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            ticks: AtomicU64::new(0),
            published: AtomicU64::new(0),
            empty: AtomicU64::new(0),
            no_connector: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            admission_timeouts: AtomicU64::new(0),
        }
    }

    pub fn kind(&self) -> ReportKind {
        self.kind
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one report result
    pub fn record(&self, outcome: &ReportOutcome) {
        let counter = match outcome {
            ReportOutcome::Published => &self.published,
            ReportOutcome::Empty => &self.empty,
            ReportOutcome::NoConnector => &self.no_connector,
            ReportOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        observability::record_report(self.kind, outcome);
    }

    pub fn record_admission_timeout(&self) {
        self.admission_timeouts.fetch_add(1, Ordering::Relaxed);
        observability::record_admission_timeout(self.kind);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> ReportSnapshot {
        ReportSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            no_connector: self.no_connector.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            admission_timeouts: self.admission_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of report lane metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSnapshot {
    pub ticks: u64,
    pub published: u64,
    pub empty: u64,
    pub no_connector: u64,
    pub failed: u64,
    pub admission_timeouts: u64,
}

impl ReportSnapshot {
    /// Reports that ran to an outcome
    pub fn completed(&self) -> u64 {
        self.published + self.empty + self.no_connector + self.failed
    }
}
