//! ProcessorRegistry - message type → processor

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{MessageType, Processor};
use tracing::debug;

use crate::error::DispatcherError;

/// Immutable lookup table from message type to its single processor
///
/// Built once at startup from an ordered `(type, processor)` list.
pub struct ProcessorRegistry {
    processors: HashMap<MessageType, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    /// Build from explicit entries
    ///
    /// # Errors
    /// - Two processors for one type
    /// - Key differs from the processor's own `message_type()`
    pub fn new(entries: Vec<(MessageType, Arc<dyn Processor>)>) -> Result<Self, DispatcherError> {
        let mut processors = HashMap::with_capacity(entries.len());

        for (message_type, processor) in entries {
            if processor.message_type() != message_type {
                return Err(DispatcherError::TypeMismatch {
                    processor: processor.name().to_string(),
                    key: message_type,
                    actual: processor.message_type(),
                });
            }
            if processors.contains_key(&message_type) {
                return Err(DispatcherError::DuplicateProcessor { message_type });
            }
            debug!(processor = %processor.name(), %message_type, "registered processor");
            processors.insert(message_type, processor);
        }

        Ok(Self { processors })
    }

    /// Build keyed by each processor's own `message_type()`
    pub fn from_processors(processors: Vec<Arc<dyn Processor>>) -> Result<Self, DispatcherError> {
        Self::new(
            processors
                .into_iter()
                .map(|p| (p.message_type(), p))
                .collect(),
        )
    }

    /// The processor registered for a type
    pub fn get(&self, message_type: MessageType) -> Option<Arc<dyn Processor>> {
        self.processors.get(&message_type).cloned()
    }

    /// Registered types, in `MessageType` declaration order
    pub fn message_types(&self) -> Vec<MessageType> {
        MessageType::ALL
            .into_iter()
            .filter(|t| self.processors.contains_key(t))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
