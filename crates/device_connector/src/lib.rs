//! # Device Connector
//!
//! 设备连接器模块。
//!
//! 负责：
//! - `DeviceConnector` 扩展点 (状态获取 / 指令执行 / 属性与事件上报)
//! - 固定编排：请求校验、空结果跳过、发布、错误钩子、状态缓存
//! - 显式设备绑定：`ConnectorHandle::bind` 返回持锁的 `DeviceSession`
//! - `ConnectorRegistry` (kind → connector) 与 `DeviceDirectory`
//!
//! ## 使用示例
//!
//! ```ignore
//! use device_connector::{ConnectorHandle, ConnectorRegistry, LogPublisher, SimulatedConnector};
//!
//! let handle = ConnectorHandle::new(
//!     Arc::new(SimulatedConnector::new("custom")),
//!     Arc::new(LogPublisher::new("log")),
//! );
//! let registry = ConnectorRegistry::from_handles(vec![Arc::new(handle)])?;
//!
//! let connector = registry.resolve(&device.identify)?;
//! let mut session = connector.bind(device).await;
//! let outcome = session.report_property().await;
//! ```

pub mod connector;
pub mod directory;
pub mod envelope;
pub mod error;
pub mod orchestrator;
pub mod publisher;
pub mod registry;
pub mod simulated;

pub use connector::DeviceConnector;
pub use directory::DeviceDirectory;
pub use envelope::{render_topic, PublishEnvelope};
pub use error::ConnectorError;
pub use orchestrator::{is_empty_result, ConnectorHandle, DeviceSession};
pub use publisher::{ChannelPublisher, LogPublisher, PublishedMessage};
pub use registry::ConnectorRegistry;
pub use simulated::SimulatedConnector;
