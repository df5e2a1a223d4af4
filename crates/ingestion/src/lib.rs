//! # Ingestion
//!
//! Inbound message ingestion module.
//!
//! Responsibilities:
//! - Bounded FIFO `IngestQueue` between transport callbacks and the dispatcher
//! - Decode transport frames (topic, payload, headers) into `Message`
//! - Register transport sources (Mock and real) behind `TransportSource`
//! - Overflow accounting: the newest message is rejected when the queue is full
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::SourceType;
//! use ingestion::{IngestQueue, IngestionPipeline, MockTransport};
//! use std::time::Duration;
//!
//! let queue = IngestQueue::new(10_000)?;
//! let mut pipeline = IngestionPipeline::new(queue.clone());
//! pipeline.register_source(Box::new(MockTransport::heartbeat("mock", 5.0, "dev-1", SourceType::Cloud)));
//! pipeline.start_all();
//!
//! while let Some(message) = queue.poll(Duration::from_secs(10)).await {
//!     // dispatch
//! }
//! ```

mod adapter;
mod config;
mod error;
mod mock;
mod pipeline;
mod queue;

// Re-exports
pub use adapter::{decode_frame, InboundFrame, TransportSource};
pub use config::{IngestionMetrics, MetricsSnapshot};
pub use contracts::Message;
pub use error::{IngestionError, Result};
pub use mock::{MockTransport, MockTransportConfig};
pub use pipeline::IngestionPipeline;
pub use queue::IngestQueue;
