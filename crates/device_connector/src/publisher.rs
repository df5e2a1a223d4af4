//! Built-in publishers

use async_trait::async_trait;
use contracts::{ContractError, MessageType, Publisher};
use tokio::sync::mpsc;
use tracing::{info, instrument};

/// Publisher that logs each publish via tracing
pub struct LogPublisher {
    name: String,
}

impl LogPublisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Publisher for LogPublisher {
    #[instrument(
        name = "log_publisher_publish",
        skip(self, payload),
        fields(publisher = %self.name)
    )]
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        message_type: MessageType,
    ) -> Result<(), ContractError> {
        info!(
            publisher = %self.name,
            %topic,
            %message_type,
            bytes = payload.len(),
            "message published"
        );
        Ok(())
    }
}

/// A publish captured by `ChannelPublisher`
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: String,
    pub message_type: MessageType,
}

/// Publisher forwarding every publish to a tokio channel
///
/// Used for loopback wiring and tests.
#[derive(Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<PublishedMessage>,
}

impl ChannelPublisher {
    pub fn new(tx: mpsc::UnboundedSender<PublishedMessage>) -> Self {
        Self { tx }
    }

    /// Create a publisher and the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PublishedMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        message_type: MessageType,
    ) -> Result<(), ContractError> {
        self.tx
            .send(PublishedMessage {
                topic: topic.to_string(),
                payload: payload.to_string(),
                message_type,
            })
            .map_err(|_| ContractError::publish(topic, "publish channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_publisher() {
        let publisher = LogPublisher::new("test_log");
        let result = publisher
            .publish("/event/dev-1", "{}", MessageType::Event)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_channel_publisher_forwards() {
        let (publisher, mut rx) = ChannelPublisher::channel();
        publisher
            .publish("/property/dev-1", "{\"a\":1}", MessageType::Property)
            .await
            .unwrap();

        let published = rx.recv().await.unwrap();
        assert_eq!(published.topic, "/property/dev-1");
        assert_eq!(published.message_type, MessageType::Property);
    }

    #[tokio::test]
    async fn test_channel_publisher_closed() {
        let (publisher, rx) = ChannelPublisher::channel();
        drop(rx);
        let err = publisher
            .publish("/property/dev-1", "{}", MessageType::Property)
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Publish { .. }));
    }
}
