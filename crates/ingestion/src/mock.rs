//! Mock 传输源
//!
//! 用于无 broker 环境的测试与演示。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use contracts::{MessageType, SourceType, HEADER_MESSAGE_TYPE, HEADER_SOURCE_TYPE};
use tracing::{debug, trace};

use crate::adapter::{decode_frame, InboundFrame, TransportSource};
use crate::queue::IngestQueue;

/// Mock 传输源配置
#[derive(Debug, Clone)]
pub struct MockTransportConfig {
    /// 传输源名称
    pub name: String,

    /// 发送频率 (Hz)
    pub frequency_hz: f64,

    /// 帧 topic
    pub topic: String,

    /// 帧负载
    pub payload: Bytes,

    /// 帧传输头
    pub headers: HashMap<String, String>,

    /// 最大帧数 (None = 不限)
    pub max_frames: Option<u64>,
}

impl Default for MockTransportConfig {
    fn default() -> Self {
        Self {
            name: "mock_transport".to_string(),
            frequency_hz: 10.0,
            topic: "/mock/device".to_string(),
            payload: Bytes::from_static(b"{}"),
            headers: HashMap::new(),
            max_frames: None,
        }
    }
}

/// Mock 传输源
///
/// 以固定频率生成同一帧，投递到 `IngestQueue`。
pub struct MockTransport {
    config: MockTransportConfig,
    running: Arc<AtomicBool>,
    frames_sent: Arc<AtomicU64>,
}

impl MockTransport {
    /// 创建新的 Mock 传输源
    pub fn new(config: MockTransportConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            frames_sent: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 创建心跳源：`/heartbeat/<device_code>`
    pub fn heartbeat(name: &str, frequency_hz: f64, device_code: &str, source: SourceType) -> Self {
        Self::new(MockTransportConfig {
            name: name.to_string(),
            frequency_hz,
            topic: format!("/heartbeat/{device_code}"),
            headers: typed_headers(MessageType::Heartbeat, source),
            ..Default::default()
        })
    }

    /// 创建指令源：`/command/<device_code>`，负载为指令请求 JSON
    pub fn command(
        name: &str,
        frequency_hz: f64,
        device_code: &str,
        request_json: &str,
        source: SourceType,
    ) -> Self {
        Self::new(MockTransportConfig {
            name: name.to_string(),
            frequency_hz,
            topic: format!("/command/{device_code}"),
            payload: Bytes::from(request_json.to_string()),
            headers: typed_headers(MessageType::CommandInvocation, source),
            ..Default::default()
        })
    }

    /// 限制最大帧数
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.config.max_frames = Some(max_frames);
        self
    }

    /// 已发送帧数
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent.load(Ordering::Relaxed)
    }
}

fn typed_headers(message_type: MessageType, source: SourceType) -> HashMap<String, String> {
    HashMap::from([
        (
            HEADER_MESSAGE_TYPE.to_string(),
            message_type.wire_name().to_string(),
        ),
        (HEADER_SOURCE_TYPE.to_string(), source.code().to_string()),
    ])
}

impl TransportSource for MockTransport {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn start(&self, queue: IngestQueue) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let running = self.running.clone();
        let frames_sent = self.frames_sent.clone();

        tokio::spawn(async move {
            // Non-positive rates fall back to one frame per second
            let interval = Duration::try_from_secs_f64(1.0 / config.frequency_hz)
                .unwrap_or(Duration::from_secs(1));

            debug!(
                transport = %config.name,
                topic = %config.topic,
                frequency_hz = config.frequency_hz,
                "mock transport started"
            );

            while running.load(Ordering::Relaxed) {
                if config
                    .max_frames
                    .is_some_and(|max| frames_sent.load(Ordering::Relaxed) >= max)
                {
                    break;
                }

                let frame = InboundFrame {
                    topic: config.topic.clone(),
                    payload: config.payload.clone(),
                    headers: config.headers.clone(),
                };

                match decode_frame(frame) {
                    Ok(message) => {
                        let accepted = queue.put(message);
                        trace!(transport = %config.name, accepted, "mock frame delivered");
                    }
                    Err(e) => {
                        queue.metrics().record_decode_error();
                        debug!(transport = %config.name, error = %e, "mock frame decode failed");
                    }
                }
                frames_sent.fetch_add(1, Ordering::Relaxed);

                if queue.is_closed() {
                    debug!(transport = %config.name, "ingest queue closed");
                    break;
                }

                tokio::time::sleep(interval).await;
            }

            running.store(false, Ordering::SeqCst);
            debug!(transport = %config.name, "mock transport stopped");
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
