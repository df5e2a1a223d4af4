//! Hub runtime - builds every component from a `HubConfig` and runs them
//! until a shutdown signal or the configured duration.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{HubConfig, MessageType, Processor, Publisher, ReportKind, SourceType};
use device_connector::{
    ConnectorHandle, ConnectorRegistry, DeviceDirectory, LogPublisher, SimulatedConnector,
};
use dispatcher::{
    CommandInvocationProcessor, DispatcherConfig, HeartbeatProcessor, LogProcessor,
    ProcessorRegistry, TypedDispatcher,
};
use fanout::{FanoutConfig, FanoutScheduler};
use ingestion::{IngestQueue, IngestionPipeline, MockTransport};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::HubStats;

/// Runtime options not carried by the configuration file
#[derive(Debug, Clone)]
pub struct HubOptions {
    /// Stop after this long (None = until signalled)
    pub duration: Option<Duration>,
    /// Generate mock traffic for the seeded devices
    pub simulate: bool,
    /// Mock traffic rate per device (Hz)
    pub simulate_hz: f64,
    /// Run the report scheduler
    pub scheduler: bool,
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            duration: None,
            simulate: false,
            simulate_hz: 1.0,
            scheduler: true,
        }
    }
}

/// Fully wired hub, ready to run
pub struct Hub {
    config: HubConfig,
    options: HubOptions,
    directory: DeviceDirectory,
    ingestion: IngestionPipeline,
    dispatcher: TypedDispatcher,
    scheduler: Option<FanoutScheduler>,
}

impl Hub {
    /// Build every component; registry conflicts fail here, before anything runs
    pub fn build(config: HubConfig, options: HubOptions) -> Result<Self> {
        let role = config.hub.role;
        let directory = DeviceDirectory::with_devices(config.devices.clone());

        let publisher: Arc<dyn Publisher> = Arc::new(LogPublisher::new(config.hub.name.clone()));
        let connectors = Arc::new(
            ConnectorRegistry::from_handles(vec![Arc::new(
                ConnectorHandle::new(Arc::new(SimulatedConnector::default()), publisher)
                    .with_topic_template(config.publisher.topic_template.clone())
                    .with_status_ttl(config.connector.status_ttl()),
            )])
            .context("Failed to build connector registry")?,
        );

        let processors = ProcessorRegistry::from_processors(processors_for(
            role,
            &directory,
            &connectors,
        ))
        .context("Failed to build processor registry")?;
        let handled_types = processors.message_types();

        let queue =
            IngestQueue::new(config.queue.capacity).context("Failed to create ingest queue")?;
        let mut ingestion = IngestionPipeline::new(queue.clone());
        if options.simulate {
            for source in mock_sources(&config, options.simulate_hz) {
                ingestion
                    .register_source(source)
                    .context("Failed to register mock transport")?;
            }
        }

        let dispatcher = TypedDispatcher::new(DispatcherConfig::from(&config), queue, processors);

        let scheduler = (options.scheduler && config.scheduler.enabled).then(|| {
            FanoutScheduler::new(
                FanoutConfig::from(&config.scheduler),
                directory.clone(),
                connectors.clone(),
            )
        });

        info!(
            hub = %config.hub.name,
            role = %role,
            devices = directory.len(),
            connectors = connectors.len(),
            handled_types = ?handled_types,
            mock_sources = ingestion.source_count(),
            scheduler = scheduler.is_some(),
            "Hub built"
        );

        Ok(Self {
            config,
            options,
            directory,
            ingestion,
            dispatcher,
            scheduler,
        })
    }

    /// Run until `shutdown` resolves or the configured duration elapses
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<HubStats> {
        let start_time = Instant::now();
        let Self {
            config,
            options,
            directory,
            ingestion,
            dispatcher,
            mut scheduler,
        } = self;

        let token = CancellationToken::new();
        let dispatch_metrics = dispatcher.metrics();
        let dispatcher_handle = dispatcher.spawn(token.child_token());

        if let Some(scheduler) = scheduler.as_mut() {
            scheduler.start().context("Failed to start report scheduler")?;
        }

        ingestion.start_all();
        info!(hub = %config.hub.name, "Hub running");

        let duration = options.duration;
        let deadline = async move {
            match duration {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = shutdown => warn!("Received shutdown signal, stopping hub..."),
            _ = deadline => info!("Run duration reached, stopping hub..."),
        }

        // Sources first, so nothing new arrives while the rest drains
        ingestion.stop_all();
        let ingestion_snapshot = ingestion.metrics();
        token.cancel();

        let grace = config.dispatcher.shutdown_grace() + Duration::from_secs(1);
        let dispatch = match tokio::time::timeout(grace, dispatcher_handle).await {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                warn!(error = %e, "Dispatcher task failed");
                Default::default()
            }
            Err(_) => {
                warn!("Dispatcher did not stop within grace period");
                Default::default()
            }
        };

        let mut reports = Vec::new();
        if let Some(scheduler) = scheduler {
            for kind in [ReportKind::Property, ReportKind::Event] {
                reports.push((kind, scheduler.metrics(kind)));
            }
            if !scheduler.shutdown().await {
                warn!("Report scheduler cancelled in-flight reports");
            }
        }

        let stats = HubStats {
            duration: start_time.elapsed(),
            ingestion: ingestion_snapshot,
            dispatch,
            dispatch_counts: dispatch_metrics.snapshot(),
            reports: reports
                .into_iter()
                .map(|(kind, metrics)| (kind, metrics.snapshot()))
                .collect(),
            devices: directory.len(),
            online_devices: directory.filter(|d| !d.offline).len(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            messages = stats.dispatch.total,
            "Hub shutdown complete"
        );
        Ok(stats)
    }
}

/// Processors each role listens for
///
/// The edge receives commands from the cloud; the cloud receives reports and
/// acknowledgments from edges. Both track heartbeats.
fn processors_for(
    role: SourceType,
    directory: &DeviceDirectory,
    connectors: &Arc<ConnectorRegistry>,
) -> Vec<Arc<dyn Processor>> {
    let mut processors: Vec<Arc<dyn Processor>> =
        vec![Arc::new(HeartbeatProcessor::new(directory.clone()))];

    match role {
        SourceType::Edge => {
            processors.push(Arc::new(CommandInvocationProcessor::new(
                directory.clone(),
                connectors.clone(),
            )));
        }
        SourceType::Cloud => {
            processors.push(Arc::new(LogProcessor::new("property_log", MessageType::Property)));
            processors.push(Arc::new(LogProcessor::new("event_log", MessageType::Event)));
            processors.push(Arc::new(LogProcessor::new(
                "acknowledgment_log",
                MessageType::CommandAcknowledgment,
            )));
        }
        SourceType::Unknown => {}
    }

    processors
}

/// Mock traffic for the seeded devices, tagged with the peer role
fn mock_sources(config: &HubConfig, hz: f64) -> Vec<Box<dyn ingestion::TransportSource>> {
    let peer = match config.hub.role {
        SourceType::Edge => SourceType::Cloud,
        _ => SourceType::Edge,
    };

    let mut sources: Vec<Box<dyn ingestion::TransportSource>> = Vec::new();
    for device in &config.devices {
        sources.push(Box::new(MockTransport::heartbeat(
            &format!("heartbeat_{}", device.code),
            hz,
            &device.code,
            peer,
        )));
        if config.hub.role == SourceType::Edge {
            sources.push(Box::new(MockTransport::command(
                &format!("command_{}", device.code),
                hz,
                &device.code,
                r#"{"identify": "ping", "params": {"simulated": true}}"#,
                peer,
            )));
        }
    }
    sources
}
