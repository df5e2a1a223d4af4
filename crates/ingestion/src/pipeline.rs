//! Ingestion Pipeline main entry

use tracing::{debug, info, instrument};

use crate::adapter::TransportSource;
use crate::config::MetricsSnapshot;
use crate::error::{IngestionError, Result};
use crate::queue::IngestQueue;

/// Ingestion Pipeline
///
/// Manages multiple transport sources feeding one shared `IngestQueue`.
pub struct IngestionPipeline {
    /// Registered sources, in registration order
    sources: Vec<Box<dyn TransportSource>>,

    /// Shared ingest queue
    queue: IngestQueue,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline over an existing queue
    pub fn new(queue: IngestQueue) -> Self {
        Self {
            sources: Vec::new(),
            queue,
        }
    }

    /// Create a pipeline with a fresh queue of the given capacity
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self::new(IngestQueue::new(capacity)?))
    }

    /// Register transport source
    ///
    /// Source names must be unique.
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source),
        fields(transport = %source.name())
    )]
    pub fn register_source(&mut self, source: Box<dyn TransportSource>) -> Result<()> {
        if self.sources.iter().any(|s| s.name() == source.name()) {
            return Err(IngestionError::DuplicateSource {
                source_name: source.name().to_string(),
            });
        }
        debug!(transport = %source.name(), "registered transport source");
        self.sources.push(source);
        Ok(())
    }

    /// Start all registered sources
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.sources.len(), "starting all transport sources");
        for source in &self.sources {
            if !source.is_listening() {
                debug!(transport = %source.name(), "starting source");
                source.start(self.queue.clone());
            }
        }
    }

    /// Stop all sources
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.sources.len(), "stopping all transport sources");
        for source in &self.sources {
            if source.is_listening() {
                debug!(transport = %source.name(), "stopping source");
                source.stop();
            }
        }
    }

    /// Get a handle onto the shared queue
    pub fn queue(&self) -> IngestQueue {
        self.queue.clone()
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.queue.metrics().snapshot()
    }

    /// Get registered source count
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Check if specified source is listening
    pub fn is_source_listening(&self, name: &str) -> bool {
        self.sources
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
