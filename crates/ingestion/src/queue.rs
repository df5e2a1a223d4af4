//! Bounded ingest queue
//!
//! Decouples transport callbacks from message processing. Producers never
//! block: when the queue is full the newest message is rejected and counted.

use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, Receiver, Sender, TrySendError};
use contracts::Message;
use tracing::{trace, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

/// Bounded FIFO queue of inbound messages
///
/// Cloning yields another handle onto the same queue, so transports and the
/// dispatcher can each hold one.
#[derive(Clone)]
pub struct IngestQueue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    capacity: usize,
    metrics: Arc<IngestionMetrics>,
}

impl IngestQueue {
    /// Create a queue with a fixed capacity (at least 1)
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(IngestionError::InvalidCapacity { capacity });
        }

        let (tx, rx) = bounded(capacity);
        Ok(Self {
            tx,
            rx,
            capacity,
            metrics: Arc::new(IngestionMetrics::new()),
        })
    }

    /// Offer a message without blocking
    ///
    /// Returns `false` when the queue is full (the message is discarded) or
    /// closed.
    pub fn put(&self, message: Message) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics.record_received();
                self.metrics.update_queue_len(self.tx.len());
                trace!(depth = self.tx.len(), "message enqueued");
                true
            }
            Err(TrySendError::Full(message)) => {
                self.metrics.record_dropped();
                warn!(
                    message_id = %message.id,
                    topic = %message.topic,
                    capacity = self.capacity,
                    "ingest queue full, message discarded"
                );
                false
            }
            Err(TrySendError::Closed(message)) => {
                warn!(message_id = %message.id, "ingest queue closed, message discarded");
                false
            }
        }
    }

    /// Take the oldest message, waiting at most `timeout`
    ///
    /// Returns `None` when nothing arrived in time or the queue is closed
    /// and drained.
    pub async fn poll(&self, timeout: Duration) -> Option<Message> {
        let message = tokio::time::timeout(timeout, self.rx.recv())
            .await
            .ok()?
            .ok()?;
        self.metrics.update_queue_len(self.rx.len());
        Some(message)
    }

    /// Take the oldest message if one is ready
    pub fn try_poll(&self) -> Option<Message> {
        let message = self.rx.try_recv().ok()?;
        self.metrics.update_queue_len(self.rx.len());
        Some(message)
    }

    /// Current number of queued messages
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Close the queue; further `put` calls are rejected, queued messages
    /// remain pollable.
    pub fn close(&self) {
        self.tx.close();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MessageType, SourceType};

    fn message(n: usize) -> Message {
        Message::new(
            format!("/topic/{n}"),
            "{}",
            Some(MessageType::Event),
            SourceType::Cloud,
        )
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            IngestQueue::new(0),
            Err(IngestionError::InvalidCapacity { capacity: 0 })
        ));
    }

    #[tokio::test]
    async fn test_overflow_rejects_newest() {
        let queue = IngestQueue::new(2).unwrap();

        assert!(queue.put(message(1)));
        assert!(queue.put(message(2)));
        assert!(!queue.put(message(3)));
        assert_eq!(queue.len(), 2);

        // FIFO, and the rejected message never shows up
        let first = queue.poll(Duration::from_millis(10)).await.unwrap();
        let second = queue.poll(Duration::from_millis(10)).await.unwrap();
        assert_eq!(first.topic, "/topic/1");
        assert_eq!(second.topic, "/topic/2");
        assert!(queue.poll(Duration::from_millis(10)).await.is_none());

        let snapshot = queue.metrics().snapshot();
        assert_eq!(snapshot.messages_received, 2);
        assert_eq!(snapshot.messages_dropped, 1);
        assert_eq!(snapshot.queue_len, 0);
    }

    #[tokio::test]
    async fn test_poll_times_out_on_empty_queue() {
        let queue = IngestQueue::new(4).unwrap();
        let started = std::time::Instant::now();
        assert!(queue.poll(Duration::from_millis(30)).await.is_none());
        assert!(started.elapsed() >= Duration::from_millis(25));
    }

    #[tokio::test]
    async fn test_poll_wakes_on_put() {
        let queue = IngestQueue::new(4).unwrap();
        let producer = queue.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.put(message(7));
        });

        let received = queue.poll(Duration::from_secs(1)).await.unwrap();
        assert_eq!(received.topic, "/topic/7");
    }

    #[tokio::test]
    async fn test_close_keeps_queued_messages() {
        let queue = IngestQueue::new(4).unwrap();
        assert!(queue.put(message(1)));
        queue.close();

        assert!(!queue.put(message(2)));
        assert!(queue.try_poll().is_some());
        assert!(queue.poll(Duration::from_millis(10)).await.is_none());
    }
}
