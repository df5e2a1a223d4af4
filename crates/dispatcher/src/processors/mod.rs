//! Built-in processors

mod command;
mod heartbeat;
mod log;
mod topic;

pub use command::CommandInvocationProcessor;
pub use heartbeat::HeartbeatProcessor;
pub use log::LogProcessor;
pub use topic::device_code_from_topic;
