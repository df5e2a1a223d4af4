//! # Observability
//!
//! Hub 可观测性：tracing 订阅器 + Prometheus 指标导出。
//!
//! ## 功能
//!
//! - 日志初始化 (JSON/Pretty/Compact)，`RUST_LOG` 优先于默认级别
//! - Prometheus exporter，安装时登记全部 `iot_hub_*` 指标的描述
//! - 指标记录函数与分发结果聚合 (见 [`metrics`])
//!
//! ## 使用示例
//!
//! ```ignore
//! use observability::{LogFormat, ObservabilityConfig};
//!
//! observability::init_with_config(ObservabilityConfig {
//!     log_format: LogFormat::Compact,
//!     metrics_port: Some(9000),
//!     ..Default::default()
//! })?;
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use ::metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

// Re-exports
pub use crate::metrics::{
    record_admission_timeout, record_command, record_dispatch, record_message_dropped,
    record_message_ingested, record_queue_depth, record_report, DispatchSummary,
    OutcomeAggregator, RunningStats, StatsSummary,
};

/// 可观测性配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// 日志格式
    pub log_format: LogFormat,
    /// Prometheus 端口 (None = 不导出)
    pub metrics_port: Option<u16>,
    /// `RUST_LOG` 未设置时的过滤级别
    pub default_log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
        }
    }
}

/// 日志格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON 结构化日志
    #[default]
    Json,
    /// 人类可读格式
    Pretty,
    /// 紧凑单行格式
    Compact,
}

/// 以默认配置初始化：JSON 日志，不导出指标
pub fn init() -> Result<()> {
    init_with_config(ObservabilityConfig::default())
}

/// 使用自定义配置初始化
///
/// 全局订阅器只能安装一次；重复调用返回错误。
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    tracing_subscriber::registry()
        .with(fmt_layer(config.log_format).with_filter(filter))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        install_metrics_exporter(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );
    Ok(())
}

fn fmt_layer(format: LogFormat) -> Box<dyn Layer<Registry> + Send + Sync> {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true)
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_target(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    }
}

/// 安装 Prometheus exporter (监听 0.0.0.0:`port`)
///
/// 可在 tracing 已初始化之后单独调用。
pub fn install_metrics_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on port {port}"))?;

    describe_metrics();
    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}

/// 登记指标描述 (出现在 `/metrics` 的 HELP 行)
fn describe_metrics() {
    describe_counter!(
        "iot_hub_messages_ingested_total",
        "Messages accepted by the ingest queue"
    );
    describe_counter!(
        "iot_hub_messages_dropped_total",
        "Messages discarded before dispatch, by reason"
    );
    describe_gauge!("iot_hub_ingest_queue_depth", "Messages waiting in the ingest queue");
    describe_counter!(
        "iot_hub_dispatch_total",
        "Dispatched messages by terminal outcome"
    );
    describe_histogram!(
        "iot_hub_dispatch_latency_ms",
        Unit::Milliseconds,
        "Time from routing to processor completion or deadline"
    );
    describe_counter!("iot_hub_reports_total", "Device reports by kind and outcome");
    describe_counter!(
        "iot_hub_admission_timeouts_total",
        "Devices skipped because the admission wait expired"
    );
    describe_counter!("iot_hub_commands_total", "Command executions by outcome");
}
