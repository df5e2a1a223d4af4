//! Message - transport output, IngestQueue element
//!
//! Topic-addressed payload plus the two routing tags read from transport headers.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header carrying the message type wire name
pub const HEADER_MESSAGE_TYPE: &str = "MessageType";

/// Header carrying the source tag
pub const HEADER_SOURCE_TYPE: &str = "MessageSourceType";

/// Header carrying the message id
pub const HEADER_MESSAGE_ID: &str = "MessageId";

/// Message type (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    CommandInvocation,
    CommandAcknowledgment,
    Event,
    Notification,
    Property,
    Heartbeat,
    Custom,
    Unsupported,
}

impl MessageType {
    /// Every variant, in declaration order
    pub const ALL: [MessageType; 10] = [
        MessageType::Request,
        MessageType::Response,
        MessageType::CommandInvocation,
        MessageType::CommandAcknowledgment,
        MessageType::Event,
        MessageType::Notification,
        MessageType::Property,
        MessageType::Heartbeat,
        MessageType::Custom,
        MessageType::Unsupported,
    ];

    /// Name used in the `MessageType` header
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::CommandInvocation => "invocation",
            Self::CommandAcknowledgment => "acknowledgment",
            Self::Event => "event",
            Self::Notification => "notification",
            Self::Property => "property",
            Self::Heartbeat => "heartbeat_request",
            Self::Custom => "custom",
            Self::Unsupported => "unsupported",
        }
    }

    /// Resolve a header value
    ///
    /// A missing or blank header does not resolve (`None`); any other unmatched
    /// value resolves to `Unsupported`. Matching ignores ASCII case.
    pub fn match_header(value: Option<&str>) -> Option<Self> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        let matched = Self::ALL
            .iter()
            .copied()
            .find(|t| t.wire_name().eq_ignore_ascii_case(value))
            .unwrap_or(Self::Unsupported);
        Some(matched)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Message provenance tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Cloud,
    Edge,
    #[default]
    Unknown,
}

impl SourceType {
    /// Code used in the `MessageSourceType` header
    pub fn code(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Edge => "edge",
            Self::Unknown => "unknown",
        }
    }

    /// Resolve a header value; blank or unmatched values map to `Unknown`
    pub fn match_header(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::Unknown;
        };
        [Self::Cloud, Self::Edge]
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(value))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Inbound message
#[derive(Debug, Clone)]
pub struct Message {
    /// Message id (from `MessageId` header or generated)
    pub id: String,

    /// Topic the message was received on
    pub topic: String,

    /// Raw payload
    pub payload: Bytes,

    /// Resolved type (`None` when the header was missing or blank)
    pub message_type: Option<MessageType>,

    /// Resolved source tag
    pub source_type: SourceType,
}

impl Message {
    /// Create a message with a generated id
    pub fn new(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        message_type: Option<MessageType>,
        source_type: SourceType,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            payload: payload.into(),
            message_type,
            source_type,
        }
    }

    /// Build from transport headers
    pub fn from_headers(
        topic: impl Into<String>,
        payload: impl Into<Bytes>,
        headers: &HashMap<String, String>,
    ) -> Self {
        let message_type = MessageType::match_header(header(headers, HEADER_MESSAGE_TYPE));
        let source_type = SourceType::match_header(header(headers, HEADER_SOURCE_TYPE));
        let message = Self::new(topic, payload, message_type, source_type);
        match header(headers, HEADER_MESSAGE_ID).filter(|id| !id.is_empty()) {
            Some(id) => message.with_id(id),
            None => message,
        }
    }

    /// Override the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Payload decoded as UTF-8 (lossy)
    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

fn header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
