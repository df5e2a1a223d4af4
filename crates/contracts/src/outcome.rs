//! Typed outcomes of every processing attempt
//!
//! Failures never propagate past the component that detects them; these values
//! carry what happened instead.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{MessageType, SourceType};

/// Why a message was rejected before routing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Source tag missing or not recognized
    UnknownSource,
    /// Source tag equals the local role (self-echo)
    OwnSource(SourceType),
    /// Type header missing or blank
    UnresolvedType,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSource => f.write_str("unknown source"),
            Self::OwnSource(source) => write!(f, "own source '{source}'"),
            Self::UnresolvedType => f.write_str("unresolved message type"),
        }
    }
}

/// Terminal state of one dispatched message
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Processor returned in time
    Completed { processor: String },
    /// Deadline expired; task abandoned (best-effort cancellation)
    TimedOut {
        processor: String,
        deadline: Duration,
    },
    /// Rejected before routing
    Rejected(RejectReason),
    /// No processor registered for the type
    Dropped { message_type: MessageType },
    /// Processor returned an error or panicked
    Failed { processor: String, error: String },
}

impl DispatchOutcome {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::TimedOut { .. } => "timed_out",
            Self::Rejected(_) => "rejected",
            Self::Dropped { .. } => "dropped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of a command execution through a connector
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    /// Result published as a command acknowledgment
    Acknowledged,
    /// Extension returned nothing to publish
    NoResult,
    /// Request failed validation; extension not invoked
    Invalid(String),
    /// Extension or publish failed
    Failed(String),
}

impl ExecOutcome {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Acknowledged => "acknowledged",
            Self::NoResult => "no_result",
            Self::Invalid(_) => "invalid",
            Self::Failed(_) => "failed",
        }
    }
}

/// Report kind driven by the fan-out scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Property,
    Event,
}

impl ReportKind {
    /// Message type used when publishing this report
    pub fn message_type(self) -> MessageType {
        match self {
            Self::Property => MessageType::Property,
            Self::Event => MessageType::Event,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one property/event report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    /// Payload published
    Published,
    /// Extension returned nothing; publish skipped
    Empty,
    /// No connector registered for the device kind
    NoConnector,
    /// Extension or publish failed
    Failed(String),
}

impl ReportOutcome {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Empty => "empty",
            Self::NoConnector => "no_connector",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_kind_message_type() {
        assert_eq!(ReportKind::Property.message_type(), MessageType::Property);
        assert_eq!(ReportKind::Event.message_type(), MessageType::Event);
    }

    #[test]
    fn test_reject_reason_display() {
        let reason = RejectReason::OwnSource(SourceType::Edge);
        assert_eq!(reason.to_string(), "own source 'edge'");
    }
}
