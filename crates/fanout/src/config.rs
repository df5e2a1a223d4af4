//! Scheduler configuration

use std::time::Duration;

use contracts::{EligibilityPolicy, ReportKind, ReportScheduleConfig, SchedulerConfig};

/// Timer period and throttle tiers of one report lane
#[derive(Debug, Clone)]
pub struct ReportSchedule {
    /// Timer period
    pub period: Duration,
    /// Admission limit (in-flight logical tasks)
    pub max_concurrent_tasks: usize,
    /// Executor limit (tasks running at once)
    pub max_workers: usize,
}

impl From<&ReportScheduleConfig> for ReportSchedule {
    fn from(config: &ReportScheduleConfig) -> Self {
        Self {
            period: config.period(),
            max_concurrent_tasks: config.max_concurrent_tasks,
            max_workers: config.max_workers,
        }
    }
}

/// Fanout scheduler configuration
#[derive(Debug, Clone)]
pub struct FanoutConfig {
    pub property: ReportSchedule,
    pub event: ReportSchedule,
    /// Per-device admission wait budget
    pub admission_wait: Duration,
    /// Which devices a tick considers
    pub eligibility: EligibilityPolicy,
    /// Timer and pool drain grace period on shutdown
    pub shutdown_grace: Duration,
}

impl FanoutConfig {
    pub fn schedule(&self, kind: ReportKind) -> &ReportSchedule {
        match kind {
            ReportKind::Property => &self.property,
            ReportKind::Event => &self.event,
        }
    }
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for FanoutConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            property: ReportSchedule::from(&config.property),
            event: ReportSchedule::from(&config.event),
            admission_wait: config.admission_wait(),
            eligibility: config.eligibility,
            shutdown_grace: config.shutdown_grace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FanoutConfig::default();
        assert_eq!(config.schedule(ReportKind::Property).period, Duration::from_secs(30));
        assert_eq!(config.schedule(ReportKind::Event).period, Duration::from_secs(60));
        assert_eq!(config.admission_wait, Duration::from_secs(5));
        assert_eq!(config.eligibility, EligibilityPolicy::ActiveOnline);
    }
}
