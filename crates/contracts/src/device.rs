//! Device model - device directory records, cached status, command requests

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command parameters
pub type CommandParams = HashMap<String, Value>;

/// Device record owned by the device directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device code
    pub code: String,

    /// Connector kind governing this device (connector registry key)
    pub identify: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Device enabled
    #[serde(default = "default_active")]
    pub active: bool,

    /// Device communication lost
    #[serde(default)]
    pub offline: bool,

    /// Last heartbeat seen
    #[serde(default)]
    pub last_heartbeat: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Device {
    /// Create an active, online device
    pub fn new(code: impl Into<String>, identify: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            identify: identify.into(),
            name: None,
            active: true,
            offline: false,
            last_heartbeat: None,
        }
    }

    /// Set active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set offline flag
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Project the status fields
    pub fn status(&self) -> DeviceStatus {
        DeviceStatus::from(self)
    }
}

/// Device status projection cached by a connector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub device_code: String,
    pub active: bool,
    pub offline: bool,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl From<&Device> for DeviceStatus {
    fn from(device: &Device) -> Self {
        Self {
            device_code: device.code.clone(),
            active: device.active,
            offline: device.offline,
            last_heartbeat: device.last_heartbeat,
        }
    }
}

/// Command invocation request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CommandRequest {
    /// Command identifier
    #[serde(default)]
    pub identify: String,

    /// Input parameters
    #[serde(default, alias = "inputParams")]
    pub params: Option<CommandParams>,
}

impl CommandRequest {
    /// Create a request
    pub fn new(identify: impl Into<String>, params: CommandParams) -> Self {
        Self {
            identify: identify.into(),
            params: Some(params),
        }
    }
}
