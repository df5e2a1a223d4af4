//! TypedDispatcher - single consumer loop routing messages to processors

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{DispatchOutcome, HubConfig, Message, Processor, RejectReason, SourceType};
use ingestion::IngestQueue;
use observability::{DispatchSummary, OutcomeAggregator};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::DispatchMetrics;
use crate::pool::WorkerPool;
use crate::registry::ProcessorRegistry;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Local role; messages tagged with it are self-echo
    pub local_role: SourceType,
    /// Queue poll wait
    pub poll_timeout: Duration,
    /// Per-message processing deadline
    pub process_timeout: Duration,
    /// Worker pool drain grace period on shutdown
    pub shutdown_grace: Duration,
}

impl DispatcherConfig {
    /// Defaults: poll 10 s, deadline 5 s, grace 10 s
    pub fn new(local_role: SourceType) -> Self {
        Self {
            local_role,
            poll_timeout: Duration::from_secs(10),
            process_timeout: Duration::from_secs(5),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl From<&HubConfig> for DispatcherConfig {
    fn from(config: &HubConfig) -> Self {
        Self {
            local_role: config.hub.role,
            poll_timeout: config.queue.poll_timeout(),
            process_timeout: config.dispatcher.process_timeout(),
            shutdown_grace: config.dispatcher.shutdown_grace(),
        }
    }
}

/// Single-consumer dispatcher
///
/// Drains the ingest queue in FIFO order. Each accepted message runs on the
/// worker pool under its own deadline; the loop waits at most that long
/// before moving to the next message.
pub struct TypedDispatcher {
    config: DispatcherConfig,
    queue: IngestQueue,
    processors: Arc<ProcessorRegistry>,
    pool: WorkerPool,
    metrics: Arc<DispatchMetrics>,
    aggregator: OutcomeAggregator,
}

impl TypedDispatcher {
    pub fn new(config: DispatcherConfig, queue: IngestQueue, processors: ProcessorRegistry) -> Self {
        Self {
            config,
            queue,
            processors: Arc::new(processors),
            pool: WorkerPool::new("dispatch"),
            metrics: Arc::new(DispatchMetrics::new()),
            aggregator: OutcomeAggregator::new(),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Resolve the processor for a message, or the outcome that ends it
    ///
    /// Order: unknown source, own source, unresolved type, missing processor.
    pub fn route(&self, message: &Message) -> Result<Arc<dyn Processor>, DispatchOutcome> {
        if message.source_type == SourceType::Unknown {
            error!(
                message_id = %message.id,
                topic = %message.topic,
                "message rejected: source tag missing or unknown"
            );
            return Err(DispatchOutcome::Rejected(RejectReason::UnknownSource));
        }

        if message.source_type == self.config.local_role {
            warn!(
                message_id = %message.id,
                topic = %message.topic,
                source = %message.source_type,
                "message rejected: originated from local role"
            );
            return Err(DispatchOutcome::Rejected(RejectReason::OwnSource(
                message.source_type,
            )));
        }

        let Some(message_type) = message.message_type else {
            error!(
                message_id = %message.id,
                topic = %message.topic,
                "message rejected: message type missing or invalid"
            );
            return Err(DispatchOutcome::Rejected(RejectReason::UnresolvedType));
        };

        self.processors.get(message_type).ok_or_else(|| {
            error!(
                message_id = %message.id,
                topic = %message.topic,
                %message_type,
                "no processor registered, message dropped"
            );
            DispatchOutcome::Dropped { message_type }
        })
    }

    /// Route and execute one message
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, message),
        fields(message_id = %message.id, topic = %message.topic)
    )]
    pub async fn dispatch(&self, message: Message) -> DispatchOutcome {
        self.dispatch_timed(message).await.0
    }

    async fn dispatch_timed(&self, message: Message) -> (DispatchOutcome, f64) {
        let started = Instant::now();

        let outcome = match self.route(&message) {
            Ok(processor) => self.execute(processor, message).await,
            Err(outcome) => outcome,
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.metrics.record(&outcome);
        observability::record_dispatch(&outcome, latency_ms);
        (outcome, latency_ms)
    }

    async fn execute(&self, processor: Arc<dyn Processor>, message: Message) -> DispatchOutcome {
        let name = processor.name().to_string();
        let deadline = self.config.process_timeout;
        debug!(processor = %name, "processing message");

        let topic = message.topic.clone();
        let content = message.content().into_owned();
        let mut handle = self
            .pool
            .spawn(async move { processor.process(&topic, &content).await });

        match tokio::time::timeout(deadline, &mut handle).await {
            Ok(Ok(Some(Ok(())))) => {
                debug!(processor = %name, "message processed");
                DispatchOutcome::Completed { processor: name }
            }
            Ok(Ok(Some(Err(err)))) => {
                error!(
                    processor = %name,
                    message_id = %message.id,
                    topic = %message.topic,
                    error = %err,
                    "message processing failed"
                );
                DispatchOutcome::Failed {
                    processor: name,
                    error: err.to_string(),
                }
            }
            Ok(Ok(None)) => {
                warn!(processor = %name, message_id = %message.id, "processing cancelled by shutdown");
                DispatchOutcome::Failed {
                    processor: name,
                    error: "cancelled during shutdown".to_string(),
                }
            }
            Ok(Err(join_err)) => {
                let error = if join_err.is_panic() {
                    "processor panicked".to_string()
                } else {
                    join_err.to_string()
                };
                error!(
                    processor = %name,
                    message_id = %message.id,
                    topic = %message.topic,
                    %error,
                    "message processing aborted"
                );
                DispatchOutcome::Failed {
                    processor: name,
                    error,
                }
            }
            Err(_) => {
                // Best effort: the task may already be past its last await point
                handle.abort();
                warn!(
                    processor = %name,
                    message_id = %message.id,
                    topic = %message.topic,
                    deadline_ms = deadline.as_millis() as u64,
                    "message processing timed out"
                );
                DispatchOutcome::TimedOut {
                    processor: name,
                    deadline,
                }
            }
        }
    }

    /// Run the dispatcher main loop
    ///
    /// Returns when `shutdown` fires or the queue is closed and drained; the
    /// worker pool is then drained within the configured grace period.
    #[instrument(name = "dispatcher_run", skip(self, shutdown))]
    pub async fn run(mut self, shutdown: CancellationToken) -> DispatchSummary {
        info!(
            processors = self.processors.len(),
            role = %self.config.local_role,
            deadline_ms = self.config.process_timeout.as_millis() as u64,
            "Dispatcher started"
        );

        loop {
            if self.queue.is_closed() && self.queue.is_empty() {
                info!("ingest queue closed and drained");
                break;
            }

            let polled = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                polled = self.queue.poll(self.config.poll_timeout) => polled,
            };

            let Some(message) = polled else {
                debug!("no messages in queue within the poll timeout");
                continue;
            };

            let (outcome, latency_ms) = self.dispatch_timed(message).await;
            self.aggregator.update(&outcome, latency_ms);

            if self.aggregator.total % 100 == 0 {
                debug!(messages = self.aggregator.total, "Dispatcher progress");
            }
        }

        info!(
            in_flight = self.pool.active(),
            "Dispatcher stopping, draining worker pool"
        );
        if !self.pool.shutdown(self.config.shutdown_grace).await {
            warn!("dispatch workers cancelled after grace period");
        }

        let summary = self.aggregator.summary();
        info!(
            total = summary.total,
            completed = summary.completed,
            timed_out = summary.timed_out,
            failed = summary.failed,
            rejected = summary.rejected,
            dropped = summary.dropped,
            "Dispatcher shutdown complete"
        );
        summary
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<DispatchSummary> {
        tokio::spawn(self.run(shutdown))
    }
}
