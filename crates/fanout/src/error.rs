//! Fanout 错误类型

use thiserror::Error;

/// Fanout 错误
#[derive(Debug, Error)]
pub enum FanoutError {
    /// 调度器已启动
    #[error("scheduler already started")]
    AlreadyStarted,

    /// 调度器已关闭
    #[error("scheduler has been shut down")]
    ShutDown,
}
