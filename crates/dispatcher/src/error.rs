//! Dispatcher error types

use contracts::MessageType;
use thiserror::Error;

/// Dispatcher-specific errors raised while wiring at startup
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Two processors registered for one message type
    #[error("duplicate processor for message type '{message_type}'")]
    DuplicateProcessor { message_type: MessageType },

    /// Registry key does not match the processor's own type
    #[error("processor '{processor}' handles '{actual}' but was registered for '{key}'")]
    TypeMismatch {
        processor: String,
        key: MessageType,
        actual: MessageType,
    },

    /// Error from the shared contract taxonomy
    #[error("dispatcher error: {0}")]
    Contract(#[from] contracts::ContractError),
}
