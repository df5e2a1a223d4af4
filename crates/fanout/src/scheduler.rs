//! FanoutScheduler - admission-controlled periodic report dispatch

use std::sync::Arc;

use contracts::{Device, ReportKind, ReportOutcome};
use device_connector::{ConnectorRegistry, DeviceDirectory};
use dispatcher::WorkerPool;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::FanoutConfig;
use crate::error::FanoutError;
use crate::metrics::ReportMetrics;

/// One report kind: admission permits, executor and counters
struct ReportLane {
    kind: ReportKind,
    admission: Arc<Semaphore>,
    pool: WorkerPool,
    metrics: Arc<ReportMetrics>,
}

impl ReportLane {
    fn new(kind: ReportKind, config: &FanoutConfig) -> Self {
        let schedule = config.schedule(kind);
        Self {
            kind,
            admission: Arc::new(Semaphore::new(schedule.max_concurrent_tasks)),
            pool: WorkerPool::with_parallelism(
                format!("{}_reports", kind.as_str()),
                schedule.max_workers,
            ),
            metrics: Arc::new(ReportMetrics::new(kind)),
        }
    }
}

struct Shared {
    config: FanoutConfig,
    directory: DeviceDirectory,
    connectors: Arc<ConnectorRegistry>,
    property: ReportLane,
    event: ReportLane,
}

impl Shared {
    fn lane(&self, kind: ReportKind) -> &ReportLane {
        match kind {
            ReportKind::Property => &self.property,
            ReportKind::Event => &self.event,
        }
    }

    #[instrument(name = "fanout_tick", skip(self), fields(kind = %kind))]
    async fn tick(&self, kind: ReportKind) -> TickReport {
        let lane = self.lane(kind);
        lane.metrics.record_tick();

        let policy = self.config.eligibility;
        let eligible = self.directory.filter(|device| policy.admits(device));

        let mut report = TickReport {
            kind,
            eligible: eligible.len(),
            submitted: 0,
            admission_timeouts: 0,
            tasks: Vec::with_capacity(eligible.len()),
        };

        for device in eligible {
            let permit = match timeout(
                self.config.admission_wait,
                lane.admission.clone().acquire_owned(),
            )
            .await
            {
                Ok(Ok(permit)) => permit,
                Ok(Err(_)) => {
                    warn!(%kind, "admission closed, tick abandoned");
                    break;
                }
                Err(_) => {
                    warn!(
                        %kind,
                        device = %device.code,
                        wait_ms = self.config.admission_wait.as_millis() as u64,
                        "admission wait expired, device skipped this tick"
                    );
                    lane.metrics.record_admission_timeout();
                    report.admission_timeouts += 1;
                    continue;
                }
            };

            let connectors = self.connectors.clone();
            let metrics = lane.metrics.clone();
            let task = lane.pool.spawn(async move {
                // Released when the task ends, on every path
                let _permit = permit;
                let outcome = report_device(&connectors, device, kind).await;
                metrics.record(&outcome);
                outcome
            });

            report.submitted += 1;
            report.tasks.push(task);
        }

        debug!(
            %kind,
            eligible = report.eligible,
            submitted = report.submitted,
            admission_timeouts = report.admission_timeouts,
            "tick complete"
        );
        report
    }
}

async fn report_device(
    connectors: &ConnectorRegistry,
    device: Device,
    kind: ReportKind,
) -> ReportOutcome {
    let Some(connector) = connectors.get(&device.identify) else {
        error!(
            %kind,
            device = %device.code,
            identify = %device.identify,
            "no connector registered for device kind, report dropped"
        );
        return ReportOutcome::NoConnector;
    };

    let session = connector.bind(device).await;
    let outcome = session.report(kind).await;
    outcome
}

/// What one tick did
#[derive(Debug)]
pub struct TickReport {
    pub kind: ReportKind,
    /// Devices passing the eligibility filter
    pub eligible: usize,
    /// Devices admitted and submitted to the pool
    pub submitted: usize,
    /// Devices skipped because the admission wait expired
    pub admission_timeouts: usize,
    tasks: Vec<JoinHandle<Option<ReportOutcome>>>,
}

impl TickReport {
    /// Wait for every submitted report
    ///
    /// Reports cancelled by shutdown or that panicked are left out.
    pub async fn join(self) -> Vec<ReportOutcome> {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for task in self.tasks {
            match task.await {
                Ok(Some(outcome)) => outcomes.push(outcome),
                Ok(None) => {}
                Err(e) => error!(kind = %self.kind, error = %e, "report task aborted"),
            }
        }
        outcomes
    }
}

/// Two independent report timers over a device directory
///
/// Each lane bounds in-flight reports with an admission semaphore
/// (`max_concurrent_tasks`) and running reports with its worker pool
/// (`max_workers`).
pub struct FanoutScheduler {
    shared: Arc<Shared>,
    token: CancellationToken,
    timers: Vec<JoinHandle<()>>,
}

impl FanoutScheduler {
    pub fn new(
        config: FanoutConfig,
        directory: DeviceDirectory,
        connectors: Arc<ConnectorRegistry>,
    ) -> Self {
        let property = ReportLane::new(ReportKind::Property, &config);
        let event = ReportLane::new(ReportKind::Event, &config);
        Self {
            shared: Arc::new(Shared {
                config,
                directory,
                connectors,
                property,
                event,
            }),
            token: CancellationToken::new(),
            timers: Vec::new(),
        }
    }

    pub fn config(&self) -> &FanoutConfig {
        &self.shared.config
    }

    /// Counters of one lane
    pub fn metrics(&self, kind: ReportKind) -> Arc<ReportMetrics> {
        self.shared.lane(kind).metrics.clone()
    }

    /// Run one tick of a lane now, outside the timers
    pub async fn tick(&self, kind: ReportKind) -> TickReport {
        self.shared.tick(kind).await
    }

    /// Start both timers; the first tick fires one period from now
    #[instrument(name = "fanout_start", skip(self))]
    pub fn start(&mut self) -> Result<(), FanoutError> {
        if self.token.is_cancelled() {
            return Err(FanoutError::ShutDown);
        }
        if !self.timers.is_empty() {
            return Err(FanoutError::AlreadyStarted);
        }

        for kind in [ReportKind::Property, ReportKind::Event] {
            self.timers.push(spawn_timer(
                self.shared.clone(),
                kind,
                self.token.child_token(),
            ));
        }
        info!(
            property_period_ms = self.shared.config.property.period.as_millis() as u64,
            event_period_ms = self.shared.config.event.period.as_millis() as u64,
            eligibility = ?self.shared.config.eligibility,
            "Fanout scheduler started"
        );
        Ok(())
    }

    /// Stop both timers, then drain both pools within the grace period
    ///
    /// Returns `true` if everything finished without forced cancellation.
    #[instrument(name = "fanout_shutdown", skip(self))]
    pub async fn shutdown(mut self) -> bool {
        self.token.cancel();
        let grace = self.shared.config.shutdown_grace;
        let mut clean = true;

        for timer in self.timers.drain(..) {
            match timeout(grace, timer).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(error = %e, "report timer task failed");
                    clean = false;
                }
                Err(_) => {
                    warn!("report timer did not stop within grace period");
                    clean = false;
                }
            }
        }

        for lane in [&self.shared.property, &self.shared.event] {
            if !lane.pool.shutdown(grace).await {
                clean = false;
            }
        }

        info!(clean, "Fanout scheduler shutdown complete");
        clean
    }
}

fn spawn_timer(shared: Arc<Shared>, kind: ReportKind, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = shared.config.schedule(kind).period;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(%kind, period_ms = period.as_millis() as u64, "report timer started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        report = shared.tick(kind) => {
                            debug!(%kind, submitted = report.submitted, "report tick dispatched");
                        }
                    }
                }
            }
        }

        debug!(%kind, "report timer stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportSchedule;
    use async_trait::async_trait;
    use contracts::{CommandParams, ContractError, DeviceStatus, EligibilityPolicy};
    use device_connector::{ConnectorHandle, DeviceConnector, LogPublisher};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-flight report counter shared across connectors
    #[derive(Default)]
    struct Gauge {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    /// Connector whose reports take a while
    struct SlowConnector {
        identify: String,
        delay: Duration,
        gauge: Arc<Gauge>,
    }

    impl SlowConnector {
        fn new(identify: &str, delay: Duration) -> Self {
            Self::with_gauge(identify, delay, Arc::default())
        }

        fn with_gauge(identify: &str, delay: Duration, gauge: Arc<Gauge>) -> Self {
            Self {
                identify: identify.to_string(),
                delay,
                gauge,
            }
        }

        async fn payload(&self, device: &Device) -> Result<Option<Value>, ContractError> {
            let now = self.gauge.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.gauge.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.gauge.running.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(json!({ "device": device.code })))
        }
    }

    #[async_trait]
    impl DeviceConnector for SlowConnector {
        fn identify(&self) -> &str {
            &self.identify
        }

        async fn fetch_status(&self, device: &Device) -> Result<DeviceStatus, ContractError> {
            Ok(device.status())
        }

        async fn do_exec(
            &self,
            _device: &Device,
            _identify: &str,
            _params: &CommandParams,
        ) -> Result<Option<Value>, ContractError> {
            Ok(None)
        }

        async fn do_report_property(&self, device: &Device) -> Result<Option<Value>, ContractError> {
            self.payload(device).await
        }

        async fn do_report_event(&self, device: &Device) -> Result<Option<Value>, ContractError> {
            self.payload(device).await
        }
    }

    fn config(max_concurrent_tasks: usize, admission_wait: Duration) -> FanoutConfig {
        let schedule = ReportSchedule {
            period: Duration::from_millis(50),
            max_concurrent_tasks,
            max_workers: 4,
        };
        FanoutConfig {
            property: schedule.clone(),
            event: schedule,
            admission_wait,
            eligibility: EligibilityPolicy::ActiveOnline,
            shutdown_grace: Duration::from_secs(1),
        }
    }

    fn registry_for(connectors: Vec<Arc<SlowConnector>>) -> Arc<ConnectorRegistry> {
        let handles = connectors
            .into_iter()
            .map(|c| {
                Arc::new(ConnectorHandle::new(
                    c,
                    Arc::new(LogPublisher::new("test")),
                ))
            })
            .collect();
        Arc::new(ConnectorRegistry::from_handles(handles).unwrap())
    }

    #[tokio::test]
    async fn test_tick_filters_and_reports() {
        let connector = Arc::new(SlowConnector::new("custom", Duration::ZERO));
        let directory = DeviceDirectory::with_devices([
            Device::new("dev-1", "custom"),
            Device::new("dev-2", "custom").with_offline(true),
            Device::new("dev-3", "custom").with_active(false),
            Device::new("dev-4", "unknown_kind"),
        ]);
        let scheduler = FanoutScheduler::new(
            config(4, Duration::from_millis(100)),
            directory,
            registry_for(vec![connector]),
        );

        let report = scheduler.tick(ReportKind::Property).await;
        assert_eq!(report.eligible, 2);
        assert_eq!(report.submitted, 2);

        let mut outcomes = report.join().await;
        outcomes.sort_by_key(|o| o.label());
        assert_eq!(
            outcomes,
            vec![ReportOutcome::NoConnector, ReportOutcome::Published]
        );

        let snapshot = scheduler.metrics(ReportKind::Property).snapshot();
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.no_connector, 1);
        assert_eq!(scheduler.metrics(ReportKind::Event).snapshot().ticks, 0);
    }

    #[tokio::test]
    async fn test_admission_limit_one_drops_when_budget_expires() {
        // Two kinds so the per-connector session lock does not serialize them
        let a = Arc::new(SlowConnector::new("kind_a", Duration::from_millis(200)));
        let b = Arc::new(SlowConnector::new("kind_b", Duration::from_millis(200)));
        let directory = DeviceDirectory::with_devices([
            Device::new("dev-1", "kind_a"),
            Device::new("dev-2", "kind_b"),
        ]);
        let scheduler = FanoutScheduler::new(
            config(1, Duration::from_millis(20)),
            directory,
            registry_for(vec![a, b]),
        );

        let report = scheduler.tick(ReportKind::Property).await;
        assert_eq!(report.eligible, 2);
        assert_eq!(report.submitted, 1);
        assert_eq!(report.admission_timeouts, 1);

        assert_eq!(report.join().await, vec![ReportOutcome::Published]);
        assert_eq!(
            scheduler
                .metrics(ReportKind::Property)
                .snapshot()
                .admission_timeouts,
            1
        );
    }

    #[tokio::test]
    async fn test_admission_limit_one_waits_within_budget() {
        let gauge = Arc::new(Gauge::default());
        let a = Arc::new(SlowConnector::with_gauge("kind_a", Duration::from_millis(20), gauge.clone()));
        let b = Arc::new(SlowConnector::with_gauge("kind_b", Duration::from_millis(20), gauge.clone()));
        let directory = DeviceDirectory::with_devices([
            Device::new("dev-1", "kind_a"),
            Device::new("dev-2", "kind_b"),
        ]);
        let scheduler = FanoutScheduler::new(
            config(1, Duration::from_secs(2)),
            directory,
            registry_for(vec![a, b]),
        );

        let report = scheduler.tick(ReportKind::Property).await;
        assert_eq!(report.submitted, 2);
        assert_eq!(report.admission_timeouts, 0);
        assert_eq!(report.join().await.len(), 2);

        // Never more than one report in flight across both connectors
        assert_eq!(gauge.peak.load(Ordering::SeqCst), 1);
        assert_eq!(gauge.running.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timers_tick_until_shutdown() {
        let connector = Arc::new(SlowConnector::new("custom", Duration::ZERO));
        let directory = DeviceDirectory::with_devices([Device::new("dev-1", "custom")]);
        let mut scheduler = FanoutScheduler::new(
            config(4, Duration::from_millis(100)),
            directory,
            registry_for(vec![connector]),
        );

        scheduler.start().unwrap();
        assert!(matches!(scheduler.start(), Err(FanoutError::AlreadyStarted)));

        tokio::time::sleep(Duration::from_millis(180)).await;
        let property = scheduler.metrics(ReportKind::Property);
        let event = scheduler.metrics(ReportKind::Event);

        assert!(scheduler.shutdown().await);
        assert!(property.snapshot().ticks >= 2);
        assert!(event.snapshot().published >= 1);
    }
}
