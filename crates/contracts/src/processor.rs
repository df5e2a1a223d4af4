//! Processor trait - Dispatcher handler interface

use async_trait::async_trait;

use crate::{ContractError, MessageType};

/// Message handler
///
/// Exactly one processor may be registered per `MessageType`.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Processor name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Message type this processor handles (registry key)
    fn message_type(&self) -> MessageType;

    /// Process one message
    ///
    /// # Errors
    /// Returned errors are logged at the dispatch boundary and never retried.
    async fn process(&self, topic: &str, content: &str) -> Result<(), ContractError>;
}
