//! Connector error types

use thiserror::Error;

/// Connector-layer errors raised while wiring connectors at startup
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Two connectors claim the same kind identifier
    #[error("duplicate connector identify '{identify}'")]
    DuplicateConnector { identify: String },

    /// Registry key does not match the connector's own identify
    #[error("connector registered under '{key}' reports identify '{identify}'")]
    KeyMismatch { key: String, identify: String },

    /// Error from the shared contract taxonomy
    #[error("connector error: {0}")]
    Contract(#[from] contracts::ContractError),
}
