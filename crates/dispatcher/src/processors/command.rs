//! CommandInvocationProcessor - drives a connector for `/<prefix>/<device>`

use std::sync::Arc;

use async_trait::async_trait;
use contracts::{CommandRequest, ContractError, MessageType, Processor};
use device_connector::{ConnectorRegistry, DeviceDirectory};
use tracing::{debug, instrument};

use super::topic::device_code_from_topic;

/// Executes command invocations against the device's connector
///
/// Topic → device code → directory record → connector by the device's
/// identify → decoded `CommandRequest` → bound session `exec`. Lookup and
/// decode failures are returned; execution failures are absorbed by the
/// connector's error hook.
pub struct CommandInvocationProcessor {
    directory: DeviceDirectory,
    connectors: Arc<ConnectorRegistry>,
}

impl CommandInvocationProcessor {
    pub fn new(directory: DeviceDirectory, connectors: Arc<ConnectorRegistry>) -> Self {
        Self {
            directory,
            connectors,
        }
    }
}

#[async_trait]
impl Processor for CommandInvocationProcessor {
    fn name(&self) -> &str {
        "command_invocation"
    }

    fn message_type(&self) -> MessageType {
        MessageType::CommandInvocation
    }

    #[instrument(name = "command_processor_process", skip(self, content))]
    async fn process(&self, topic: &str, content: &str) -> Result<(), ContractError> {
        let code = device_code_from_topic(topic)
            .ok_or_else(|| ContractError::decode(topic, "expected /<prefix>/<device>"))?;

        let device = self
            .directory
            .get(code)
            .ok_or_else(|| ContractError::lookup("device", code))?;

        let connector = self.connectors.resolve(&device.identify)?;

        let request: CommandRequest = serde_json::from_str(content)
            .map_err(|e| ContractError::decode(topic, format!("invalid command request: {e}")))?;

        let session = connector.bind(device).await;
        let outcome = session.exec(&request).await;
        debug!(device = %code, outcome = outcome.label(), "command handled");
        Ok(())
    }
}
