//! SimulatedConnector - in-process device kind
//!
//! Produces synthetic property and event payloads and acknowledges every
//! command. Used by the CLI `run` command and in tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use contracts::{CommandParams, ContractError, Device, DeviceStatus};
use serde_json::{json, Value};
use tracing::trace;

/// Connector simulating a device kind
pub struct SimulatedConnector {
    identify: String,
    sequence: AtomicU64,
}

impl SimulatedConnector {
    pub fn new(identify: impl Into<String>) -> Self {
        Self {
            identify: identify.into(),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::new("custom")
    }
}

#[async_trait]
impl crate::DeviceConnector for SimulatedConnector {
    fn identify(&self) -> &str {
        &self.identify
    }

    async fn fetch_status(&self, device: &Device) -> Result<DeviceStatus, ContractError> {
        Ok(device.status())
    }

    async fn do_exec(
        &self,
        device: &Device,
        identify: &str,
        params: &CommandParams,
    ) -> Result<Option<Value>, ContractError> {
        trace!(device = %device.code, command = %identify, "simulated command");
        Ok(Some(json!({
            "command": identify,
            "accepted": true,
            "params": params,
        })))
    }

    async fn do_report_property(&self, device: &Device) -> Result<Option<Value>, ContractError> {
        Ok(Some(json!({
            "key": "value",
            "device": device.code,
            "sequence": self.next_sequence(),
        })))
    }

    async fn do_report_event(&self, device: &Device) -> Result<Option<Value>, ContractError> {
        Ok(Some(json!({
            "event": "tick",
            "device": device.code,
            "sequence": self.next_sequence(),
            "at": Utc::now(),
        })))
    }
}
