//! DeviceConnector - per-kind extension points

use async_trait::async_trait;
use contracts::{CommandParams, ContractError, Device, DeviceStatus};
use serde_json::Value;
use tracing::error;

/// Extension points of a device kind
///
/// Every method receives the device it acts on; connectors keep no
/// per-device state of their own. Orchestration (validation, publishing,
/// status caching, error routing) lives in `ConnectorHandle`/`DeviceSession`.
///
/// A returned `Err` is absorbed by the orchestration layer and never
/// propagates to the caller.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    /// Kind identifier; must be unique across the connector registry
    fn identify(&self) -> &str;

    /// Stable tag used in logs
    fn tag(&self) -> &str {
        self.identify()
    }

    /// Compute the device's status projection
    async fn fetch_status(&self, device: &Device) -> Result<DeviceStatus, ContractError>;

    /// Execute a validated command
    ///
    /// `Ok(None)` or an empty value means nothing is acknowledged.
    async fn do_exec(
        &self,
        device: &Device,
        identify: &str,
        params: &CommandParams,
    ) -> Result<Option<Value>, ContractError>;

    /// Build the property report payload
    async fn do_report_property(&self, device: &Device) -> Result<Option<Value>, ContractError>;

    /// Build the event report payload
    async fn do_report_event(&self, device: &Device) -> Result<Option<Value>, ContractError>;

    /// Error hook for command execution
    ///
    /// Receives validation failures and execution errors. Logs by default.
    fn handle_exec_error(&self, device: &Device, identify: &str, err: &ContractError) {
        error!(
            connector = %self.tag(),
            device = %device.code,
            command = %identify,
            error = %err,
            "command execution failed"
        );
    }
}
