//! Layered error definitions
//!
//! Categorized by source: config / validation / lookup / decode / connector / publish

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Request Errors =====
    /// Command request failed validation (missing identifier, missing params)
    #[error("invalid request field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Unknown device, device kind or message type
    #[error("{kind} not found: {key}")]
    Lookup { kind: &'static str, key: String },

    /// Payload could not be decoded
    #[error("decode error on topic '{topic}': {message}")]
    Decode { topic: String, message: String },

    // ===== Extension Point Errors =====
    /// Connector extension point failed
    #[error("connector '{identify}' error: {message}")]
    Connector { identify: String, message: String },

    /// Processor failed
    #[error("processor '{processor}' error: {message}")]
    Processing { processor: String, message: String },

    /// Downstream publish failed
    #[error("publish to '{topic}' failed: {message}")]
    Publish { topic: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create request validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create lookup failure
    pub fn lookup(kind: &'static str, key: impl Into<String>) -> Self {
        Self::Lookup {
            kind,
            key: key.into(),
        }
    }

    /// Create decode error
    pub fn decode(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Create connector error
    pub fn connector(identify: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connector {
            identify: identify.into(),
            message: message.into(),
        }
    }

    /// Create processor error
    pub fn processing(processor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Processing {
            processor: processor.into(),
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Whether this is a request validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
