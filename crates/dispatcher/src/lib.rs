//! # Dispatcher
//!
//! 消息分发模块。
//!
//! 负责：
//! - 单消费者循环：从 `IngestQueue` 拉取消息
//! - 拒绝未知来源、自身来源 (防回环) 与无法解析类型的消息
//! - 按 `MessageType` 路由到唯一的处理器
//! - 在 `WorkerPool` 中执行，每条消息独立的硬超时
//! - 超时与处理器错误只记录，不阻塞主循环

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod processors;
pub mod registry;

pub use contracts::{DispatchOutcome, Processor};
pub use dispatcher::{DispatcherConfig, TypedDispatcher};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pool::WorkerPool;
pub use processors::{
    device_code_from_topic, CommandInvocationProcessor, HeartbeatProcessor, LogProcessor,
};
pub use registry::ProcessorRegistry;
