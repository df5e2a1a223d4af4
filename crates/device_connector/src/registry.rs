//! ConnectorRegistry - device kind → connector instance

use std::collections::HashMap;
use std::sync::Arc;

use contracts::ContractError;
use tracing::{debug, error};

use crate::error::ConnectorError;
use crate::orchestrator::ConnectorHandle;

/// Immutable lookup table from device kind to its shared connector
///
/// Built once at startup from an ordered `(key, connector)` list.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<ConnectorHandle>>,
    /// Registration order
    order: Vec<String>,
}

impl ConnectorRegistry {
    /// Build from explicit entries
    ///
    /// # Errors
    /// - Duplicate key
    /// - Key differs from the connector's identify
    pub fn new(entries: Vec<(String, Arc<ConnectorHandle>)>) -> Result<Self, ConnectorError> {
        let mut connectors = HashMap::with_capacity(entries.len());
        let mut order = Vec::with_capacity(entries.len());

        for (key, handle) in entries {
            if key != handle.identify() {
                return Err(ConnectorError::KeyMismatch {
                    key,
                    identify: handle.identify().to_string(),
                });
            }
            if connectors.contains_key(&key) {
                return Err(ConnectorError::DuplicateConnector { identify: key });
            }
            debug!(connector = %key, "registered connector");
            order.push(key.clone());
            connectors.insert(key, handle);
        }

        Ok(Self { connectors, order })
    }

    /// Build keyed by each connector's own identify
    pub fn from_handles(handles: Vec<Arc<ConnectorHandle>>) -> Result<Self, ConnectorError> {
        Self::new(
            handles
                .into_iter()
                .map(|h| (h.identify().to_string(), h))
                .collect(),
        )
    }

    /// Connector for a device kind
    pub fn get(&self, identify: &str) -> Option<Arc<ConnectorHandle>> {
        self.connectors.get(identify).cloned()
    }

    /// Connector for a device kind, logging a missing entry
    ///
    /// There is no fallback connector.
    pub fn resolve(&self, identify: &str) -> Result<Arc<ConnectorHandle>, ContractError> {
        self.get(identify).ok_or_else(|| {
            error!(identify = %identify, "no connector registered for device kind");
            ContractError::lookup("connector", identify)
        })
    }

    /// Registered kinds, in registration order
    pub fn identifiers(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publisher::LogPublisher;
    use crate::simulated::SimulatedConnector;

    fn handle(identify: &str) -> Arc<ConnectorHandle> {
        Arc::new(ConnectorHandle::new(
            Arc::new(SimulatedConnector::new(identify)),
            Arc::new(LogPublisher::new("log")),
        ))
    }

    #[test]
    fn test_lookup() {
        let registry = ConnectorRegistry::from_handles(vec![handle("custom"), handle("plc")]).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.identifiers(), ["custom", "plc"]);
        assert!(registry.get("plc").is_some());
        assert!(registry.get("camera").is_none());
    }

    #[test]
    fn test_resolve_missing_is_lookup_error() {
        let registry = ConnectorRegistry::from_handles(vec![handle("custom")]).unwrap();
        let err = registry.resolve("camera").err().unwrap();
        assert_eq!(err.to_string(), "connector not found: camera");
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = ConnectorRegistry::from_handles(vec![handle("custom"), handle("custom")]);
        assert!(matches!(
            result,
            Err(ConnectorError::DuplicateConnector { .. })
        ));
    }

    #[test]
    fn test_key_mismatch_rejected() {
        let result = ConnectorRegistry::new(vec![("plc".to_string(), handle("custom"))]);
        assert!(matches!(result, Err(ConnectorError::KeyMismatch { .. })));
    }
}
