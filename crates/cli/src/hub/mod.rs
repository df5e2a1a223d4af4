//! Hub runtime - wires queue, dispatcher, connectors and scheduler together.

mod runtime;
mod stats;

pub use runtime::{Hub, HubOptions};
pub use stats::HubStats;
