//! # Fanout
//!
//! 周期性上报调度模块。
//!
//! 两个独立定时器 (属性 / 事件)，每次触发：
//! - 快照设备目录，按 `EligibilityPolicy` 过滤
//! - 每台设备在准入等待预算内获取一个许可 (逻辑任务上限)
//! - 提交到专用 `WorkerPool` (执行并发上限)
//! - 任务内绑定设备到其连接器并上报，许可在任何路径上都会释放
//! - 准入超时只跳过本轮，下一轮自然重试

mod config;
mod error;
mod metrics;
mod scheduler;

pub use config::{FanoutConfig, ReportSchedule};
pub use error::FanoutError;
pub use metrics::{ReportMetrics, ReportSnapshot};
pub use scheduler::{FanoutScheduler, TickReport};
