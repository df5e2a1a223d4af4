//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 队列容量非法
    #[error("queue capacity must be at least 1, got {capacity}")]
    InvalidCapacity {
        /// 请求的容量
        capacity: usize,
    },

    /// 帧解码失败
    #[error("failed to decode frame on topic '{topic}': {message}")]
    DecodeFailed {
        /// 来源 topic
        topic: String,
        /// 错误消息
        message: String,
    },

    /// 传输源名称重复
    #[error("transport {source_name} is already registered")]
    DuplicateSource {
        /// 传输源名称
        source_name: String,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
