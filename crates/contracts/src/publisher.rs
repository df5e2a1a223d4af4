//! Publisher trait - downstream output interface

use async_trait::async_trait;

use crate::{ContractError, MessageType};

/// Downstream publisher
///
/// Delivery guarantees, QoS and retries belong to the implementation.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish a payload tagged with its message type
    async fn publish(
        &self,
        topic: &str,
        payload: &str,
        message_type: MessageType,
    ) -> Result<(), ContractError>;
}
