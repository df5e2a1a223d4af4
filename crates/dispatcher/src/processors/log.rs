//! LogProcessor - logs receipt of a message via tracing

use async_trait::async_trait;
use contracts::{ContractError, MessageType, Processor};
use tracing::{info, instrument};

/// Processor that only logs what it receives
///
/// Registered on the cloud side for property, event and acknowledgment
/// traffic coming up from edges.
pub struct LogProcessor {
    name: String,
    message_type: MessageType,
}

impl LogProcessor {
    pub fn new(name: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            name: name.into(),
            message_type,
        }
    }
}

#[async_trait]
impl Processor for LogProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn message_type(&self) -> MessageType {
        self.message_type
    }

    #[instrument(
        name = "log_processor_process",
        skip(self, content),
        fields(processor = %self.name)
    )]
    async fn process(&self, topic: &str, content: &str) -> Result<(), ContractError> {
        info!(
            processor = %self.name,
            message_type = %self.message_type,
            %topic,
            bytes = content.len(),
            "message received"
        );
        Ok(())
    }
}
