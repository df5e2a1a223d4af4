//! HubConfig - Config Loader output
//!
//! Describes the full hub setup: local role, queue, dispatch deadline, report
//! schedules, status cache policy, publish topics and seeded devices.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Device, SourceType};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete hub configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HubConfig {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Hub identity and role
    #[validate(nested)]
    pub hub: HubSettings,

    /// Ingest queue
    #[serde(default)]
    #[validate(nested)]
    pub queue: QueueConfig,

    /// Typed dispatcher
    #[serde(default)]
    #[validate(nested)]
    pub dispatcher: DispatcherSettings,

    /// Fan-out scheduler
    #[serde(default)]
    #[validate(nested)]
    pub scheduler: SchedulerConfig,

    /// Connector orchestration
    #[serde(default)]
    #[validate(nested)]
    pub connector: ConnectorSettings,

    /// Publish routing
    #[serde(default)]
    #[validate(nested)]
    pub publisher: PublisherConfig,

    /// Devices seeded into the directory at startup
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Hub identity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HubSettings {
    /// Hub name (logging only)
    #[validate(length(min = 1))]
    pub name: String,

    /// Local role; messages tagged with it are dropped as self-echo
    pub role: SourceType,
}

/// Ingest queue configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct QueueConfig {
    /// Fixed capacity; overflow is rejected
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub capacity: usize,

    /// Consumer poll wait in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    #[validate(range(min = 1))]
    pub poll_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
            poll_timeout_ms: default_poll_timeout_ms(),
        }
    }
}

impl QueueConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

fn default_queue_capacity() -> usize {
    10_000
}

fn default_poll_timeout_ms() -> u64 {
    10_000
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatcherSettings {
    /// Per-message processing deadline in milliseconds
    #[serde(default = "default_process_timeout_ms")]
    #[validate(range(min = 1))]
    pub process_timeout_ms: u64,

    /// Worker pool drain grace period in milliseconds
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            process_timeout_ms: default_process_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl DispatcherSettings {
    pub fn process_timeout(&self) -> Duration {
        Duration::from_millis(self.process_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_process_timeout_ms() -> u64 {
    5_000
}

fn default_shutdown_grace_ms() -> u64 {
    10_000
}

/// Fan-out scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulerConfig {
    /// Start the report timers
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Property report lane
    #[serde(default = "ReportScheduleConfig::property_default")]
    #[validate(nested)]
    pub property: ReportScheduleConfig,

    /// Event report lane
    #[serde(default = "ReportScheduleConfig::event_default")]
    #[validate(nested)]
    pub event: ReportScheduleConfig,

    /// Admission wait budget per device in milliseconds
    #[serde(default = "default_admission_wait_ms")]
    pub admission_wait_ms: u64,

    /// Device eligibility filter
    #[serde(default)]
    pub eligibility: EligibilityPolicy,

    /// Timer and pool drain grace period in milliseconds
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            property: ReportScheduleConfig::property_default(),
            event: ReportScheduleConfig::event_default(),
            admission_wait_ms: default_admission_wait_ms(),
            eligibility: EligibilityPolicy::default(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl SchedulerConfig {
    pub fn admission_wait(&self) -> Duration {
        Duration::from_millis(self.admission_wait_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_admission_wait_ms() -> u64 {
    5_000
}

/// One report lane: timer period plus the two throttle tiers
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportScheduleConfig {
    /// Timer period in milliseconds
    #[validate(range(min = 1))]
    pub period_ms: u64,

    /// Admission limit: in-flight logical tasks
    ///
    /// Both limits size a tokio `Semaphore`, capped well below its permit ceiling.
    #[validate(range(min = 1, max = 65536))]
    pub max_concurrent_tasks: usize,

    /// Executor limit: tasks actually running at once
    #[serde(default = "default_max_workers")]
    #[validate(range(min = 1, max = 65536))]
    pub max_workers: usize,
}

impl ReportScheduleConfig {
    fn property_default() -> Self {
        Self {
            period_ms: 30_000,
            max_concurrent_tasks: 10,
            max_workers: default_max_workers(),
        }
    }

    fn event_default() -> Self {
        Self {
            period_ms: 60_000,
            max_concurrent_tasks: 10,
            max_workers: default_max_workers(),
        }
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

fn default_max_workers() -> usize {
    4
}

/// Which devices a report tick considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPolicy {
    /// Active and communicating
    #[default]
    ActiveOnline,
    /// Active but offline (legacy reference filter)
    ActiveOffline,
    /// Active regardless of connectivity
    Active,
    /// Every device in the directory
    All,
}

impl EligibilityPolicy {
    /// Whether a device takes part in a report tick
    pub fn admits(self, device: &Device) -> bool {
        match self {
            Self::ActiveOnline => device.active && !device.offline,
            Self::ActiveOffline => device.active && device.offline,
            Self::Active => device.active,
            Self::All => true,
        }
    }
}

/// Connector orchestration settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ConnectorSettings {
    /// Cached status lifetime in milliseconds; absent = held until cleared
    #[serde(default)]
    #[validate(range(min = 1))]
    pub status_ttl_ms: Option<u64>,
}

impl ConnectorSettings {
    pub fn status_ttl(&self) -> Option<Duration> {
        self.status_ttl_ms.map(Duration::from_millis)
    }
}

/// Publish routing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PublisherConfig {
    /// Topic template; `{type}` and `{device}` are substituted
    #[serde(default = "default_topic_template")]
    #[validate(length(min = 1))]
    pub topic_template: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            topic_template: default_topic_template(),
        }
    }
}

fn default_topic_template() -> String {
    "/{type}/{device}".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_policies() {
        let online = Device::new("a", "custom");
        let offline = Device::new("b", "custom").with_offline(true);
        let inactive = Device::new("c", "custom").with_active(false);

        assert!(EligibilityPolicy::ActiveOnline.admits(&online));
        assert!(!EligibilityPolicy::ActiveOnline.admits(&offline));
        assert!(EligibilityPolicy::ActiveOffline.admits(&offline));
        assert!(!EligibilityPolicy::ActiveOffline.admits(&online));
        assert!(!EligibilityPolicy::Active.admits(&inactive));
        assert!(EligibilityPolicy::All.admits(&inactive));
    }

    #[test]
    fn test_defaults() {
        let queue = QueueConfig::default();
        assert_eq!(queue.capacity, 10_000);
        assert_eq!(queue.poll_timeout(), Duration::from_secs(10));
        assert_eq!(
            DispatcherSettings::default().process_timeout(),
            Duration::from_secs(5)
        );
        assert_eq!(SchedulerConfig::default().property.period_ms, 30_000);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut queue = QueueConfig::default();
        queue.capacity = 0;
        assert!(queue.validate().is_err());
    }

    #[test]
    fn test_validate_caps_lane_limits() {
        let mut lane = ReportScheduleConfig::property_default();
        assert!(lane.validate().is_ok());

        lane.max_concurrent_tasks = 65_536;
        assert!(lane.validate().is_ok());

        lane.max_concurrent_tasks = usize::MAX;
        assert!(lane.validate().is_err());

        lane.max_concurrent_tasks = 10;
        lane.max_workers = 1 << 40;
        assert!(lane.validate().is_err());
    }
}
