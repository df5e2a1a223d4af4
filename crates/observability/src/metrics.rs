//! Hub 指标收集模块
//!
//! 基于 `metrics` facade 记录 ingest / dispatch / report 指标，
//! 并提供进程内聚合器用于运行结束时输出摘要。

use std::collections::HashMap;

use contracts::{DispatchOutcome, ExecOutcome, ReportKind, ReportOutcome};
use metrics::{counter, gauge, histogram};

/// 记录消息入队
pub fn record_message_ingested() {
    counter!("iot_hub_messages_ingested_total").increment(1);
}

/// 记录消息丢弃
///
/// `reason`: `queue_full` / `rejected` / `no_processor` / `decode`
pub fn record_message_dropped(reason: &'static str) {
    counter!("iot_hub_messages_dropped_total", "reason" => reason).increment(1);
}

/// 记录队列深度
pub fn record_queue_depth(depth: usize) {
    gauge!("iot_hub_ingest_queue_depth").set(depth as f64);
}

/// 记录一次分发的终态与耗时
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_dispatch;
///
/// let outcome = dispatcher.dispatch(message).await;
/// record_dispatch(&outcome, started.elapsed().as_secs_f64() * 1000.0);
/// ```
pub fn record_dispatch(outcome: &DispatchOutcome, latency_ms: f64) {
    counter!("iot_hub_dispatch_total", "outcome" => outcome.label()).increment(1);

    // 只有真正交给处理器的消息才计入延迟
    if matches!(
        outcome,
        DispatchOutcome::Completed { .. }
            | DispatchOutcome::Failed { .. }
            | DispatchOutcome::TimedOut { .. }
    ) {
        histogram!("iot_hub_dispatch_latency_ms").record(latency_ms);
    }
}

/// 记录上报结果
pub fn record_report(kind: ReportKind, outcome: &ReportOutcome) {
    counter!(
        "iot_hub_reports_total",
        "kind" => kind.as_str(),
        "outcome" => outcome.label()
    )
    .increment(1);
}

/// 记录准入等待超时
pub fn record_admission_timeout(kind: ReportKind) {
    counter!("iot_hub_admission_timeouts_total", "kind" => kind.as_str()).increment(1);
}

/// 记录指令执行结果
pub fn record_command(outcome: &ExecOutcome) {
    counter!("iot_hub_commands_total", "outcome" => outcome.label()).increment(1);
}

/// 分发结果聚合器
///
/// 在内存中聚合分发结果，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct OutcomeAggregator {
    /// 总消息数
    pub total: u64,

    /// 各终态计数
    pub outcome_counts: HashMap<&'static str, u64>,

    /// 各处理器完成数
    pub processor_counts: HashMap<String, u64>,

    /// 处理耗时统计 (毫秒)
    pub latency_stats: RunningStats,
}

impl OutcomeAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, outcome: &DispatchOutcome, latency_ms: f64) {
        self.total += 1;
        *self.outcome_counts.entry(outcome.label()).or_insert(0) += 1;

        match outcome {
            DispatchOutcome::Completed { processor } => {
                *self.processor_counts.entry(processor.clone()).or_insert(0) += 1;
                self.latency_stats.push(latency_ms);
            }
            DispatchOutcome::Failed { .. } | DispatchOutcome::TimedOut { .. } => {
                self.latency_stats.push(latency_ms);
            }
            DispatchOutcome::Rejected(_) | DispatchOutcome::Dropped { .. } => {}
        }
    }

    /// 某终态的计数
    pub fn count(&self, label: &str) -> u64 {
        self.outcome_counts.get(label).copied().unwrap_or(0)
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        let completed = self.count("completed");
        DispatchSummary {
            total: self.total,
            completed,
            timed_out: self.count("timed_out"),
            rejected: self.count("rejected"),
            dropped: self.count("dropped"),
            failed: self.count("failed"),
            success_rate: if self.total > 0 {
                completed as f64 / self.total as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            processor_counts: self.processor_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 分发摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total: u64,
    pub completed: u64,
    pub timed_out: u64,
    pub rejected: u64,
    pub dropped: u64,
    pub failed: u64,
    pub success_rate: f64,
    pub latency_ms: StatsSummary,
    pub processor_counts: HashMap<String, u64>,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total messages: {}", self.total)?;
        writeln!(
            f,
            "Completed: {} ({:.2}%)",
            self.completed, self.success_rate
        )?;
        writeln!(f, "Timed out: {}", self.timed_out)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Rejected: {}", self.rejected)?;
        writeln!(f, "Dropped (no processor): {}", self.dropped)?;
        writeln!(f, "Processing latency (ms): {}", self.latency_ms)?;

        if !self.processor_counts.is_empty() {
            writeln!(f, "Completed per processor:")?;
            for (processor, count) in &self.processor_counts {
                writeln!(f, "  {}: {}", processor, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
