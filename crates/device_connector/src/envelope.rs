//! Published payload envelope and topic rendering

use chrono::{DateTime, Utc};
use contracts::MessageType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON envelope wrapped around every published payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEnvelope {
    pub device_code: String,
    /// Wire name of the message type
    pub message_type: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl PublishEnvelope {
    pub fn new(device_code: impl Into<String>, message_type: MessageType, data: Value) -> Self {
        Self {
            device_code: device_code.into(),
            message_type: message_type.wire_name().to_string(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Render a publish topic; `{type}` becomes the wire name, `{device}` the device code
pub fn render_topic(template: &str, message_type: MessageType, device_code: &str) -> String {
    template
        .replace("{type}", message_type.wire_name())
        .replace("{device}", device_code)
}
