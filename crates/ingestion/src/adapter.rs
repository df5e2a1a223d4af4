//! 传输源 trait 与帧解码

use std::collections::HashMap;

use bytes::Bytes;
use contracts::Message;

use crate::error::{IngestionError, Result};
use crate::queue::IngestQueue;

/// 传输层收到的原始帧
#[derive(Debug, Clone, Default)]
pub struct InboundFrame {
    /// 来源 topic
    pub topic: String,
    /// 原始负载
    pub payload: Bytes,
    /// 传输头 (`MessageType` / `MessageSourceType` / `MessageId`)
    pub headers: HashMap<String, String>,
}

impl InboundFrame {
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            headers: HashMap::new(),
        }
    }

    /// 追加一个传输头
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// 将传输帧解码为 `Message`
///
/// 类型与来源头在这里解析；缺失或空白的类型头保留为 `None`，
/// 由分发器拒绝。
pub fn decode_frame(frame: InboundFrame) -> Result<Message> {
    if frame.topic.is_empty() {
        return Err(IngestionError::DecodeFailed {
            topic: frame.topic,
            message: "empty topic".to_string(),
        });
    }
    Ok(Message::from_headers(
        frame.topic,
        frame.payload,
        &frame.headers,
    ))
}

/// 传输源 trait
///
/// 为每种消息传输 (MQTT 订阅、mock 等) 实现此 trait，负责：
/// 1. 注册传输回调
/// 2. 解码传输帧
/// 3. 投递到 `IngestQueue`（队列满时由队列丢弃最新消息）
pub trait TransportSource: Send + Sync {
    /// 获取传输源名称
    fn name(&self) -> &str;

    /// 启动接收
    ///
    /// # Arguments
    /// * `queue` - 目标入队队列
    fn start(&self, queue: IngestQueue);

    /// 停止接收
    fn stop(&self);

    /// 检查是否正在监听
    fn is_listening(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{MessageType, SourceType, HEADER_MESSAGE_ID, HEADER_MESSAGE_TYPE, HEADER_SOURCE_TYPE};

    #[test]
    fn test_decode_frame_resolves_headers() {
        let frame = InboundFrame::new("/command/dev-1", "{}")
            .with_header(HEADER_MESSAGE_TYPE, "invocation")
            .with_header(HEADER_SOURCE_TYPE, "cloud")
            .with_header(HEADER_MESSAGE_ID, "m-1");

        let message = decode_frame(frame).unwrap();
        assert_eq!(message.id, "m-1");
        assert_eq!(message.message_type, Some(MessageType::CommandInvocation));
        assert_eq!(message.source_type, SourceType::Cloud);
    }

    #[test]
    fn test_decode_frame_without_headers() {
        let message = decode_frame(InboundFrame::new("/x/y", "payload")).unwrap();
        assert_eq!(message.message_type, None);
        assert_eq!(message.source_type, SourceType::Unknown);
        assert!(!message.id.is_empty());
    }

    #[test]
    fn test_decode_frame_empty_topic() {
        assert!(matches!(
            decode_frame(InboundFrame::new("", "payload")),
            Err(IngestionError::DecodeFailed { .. })
        ));
    }
}
