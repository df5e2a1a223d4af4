//! HeartbeatProcessor - marks the topic's device online

use async_trait::async_trait;
use chrono::Utc;
use contracts::{ContractError, MessageType, Processor};
use device_connector::DeviceDirectory;
use tracing::debug;

use super::topic::device_code_from_topic;

/// Stamps `last_heartbeat` and clears `offline` for `/<prefix>/<device>`
pub struct HeartbeatProcessor {
    directory: DeviceDirectory,
}

impl HeartbeatProcessor {
    pub fn new(directory: DeviceDirectory) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl Processor for HeartbeatProcessor {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn message_type(&self) -> MessageType {
        MessageType::Heartbeat
    }

    async fn process(&self, topic: &str, _content: &str) -> Result<(), ContractError> {
        let code = device_code_from_topic(topic)
            .ok_or_else(|| ContractError::decode(topic, "expected /<prefix>/<device>"))?;

        if !self.directory.touch_heartbeat(code, Utc::now()) {
            return Err(ContractError::lookup("device", code));
        }
        debug!(device = %code, "heartbeat recorded");
        Ok(())
    }
}
