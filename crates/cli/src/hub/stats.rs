//! Hub run statistics.

use std::time::Duration;

use contracts::ReportKind;
use dispatcher::MetricsSnapshot as DispatchCounts;
use fanout::ReportSnapshot;
use ingestion::MetricsSnapshot as IngestionSnapshot;
use observability::DispatchSummary;

/// Statistics from a hub run
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Ingest queue counters
    pub ingestion: IngestionSnapshot,

    /// Dispatcher outcome aggregation
    pub dispatch: DispatchSummary,

    /// Dispatcher atomic counters
    pub dispatch_counts: DispatchCounts,

    /// Report lane counters (empty when the scheduler was off)
    pub reports: Vec<(ReportKind, ReportSnapshot)>,

    /// Devices in the directory at shutdown
    pub devices: usize,

    /// Devices not marked offline at shutdown
    pub online_devices: usize,
}

impl HubStats {
    /// Dispatched messages per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch_counts.total() as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Queue overflow rate as percentage of offered messages
    pub fn drop_rate(&self) -> f64 {
        let offered = self.ingestion.messages_received + self.ingestion.messages_dropped;
        if offered > 0 {
            (self.ingestion.messages_dropped as f64 / offered as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                       Hub Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Messages received: {}", self.ingestion.messages_received);
        println!(
            "   ├─ Queue overflow: {} ({:.2}%)",
            self.ingestion.messages_dropped,
            self.drop_rate()
        );
        println!("   ├─ Decode errors: {}", self.ingestion.decode_errors);
        println!("   ├─ Throughput: {:.2} msg/s", self.throughput());
        println!(
            "   └─ Devices: {} ({} online)",
            self.devices, self.online_devices
        );

        let summary = &self.dispatch;
        println!("\n📈 Dispatch");
        println!(
            "   ├─ Completed: {} ({:.2}%)",
            summary.completed, summary.success_rate
        );
        println!("   ├─ Timed out: {}", summary.timed_out);
        println!("   ├─ Failed: {}", summary.failed);
        println!("   ├─ Rejected: {}", summary.rejected);
        println!("   ├─ Dropped (no processor): {}", summary.dropped);
        println!("   └─ Latency (ms): {}", summary.latency_ms);

        if !summary.processor_counts.is_empty() {
            println!("\n⚙️  Per Processor");
            let mut counts: Vec<_> = summary.processor_counts.iter().collect();
            counts.sort();
            for (processor, count) in counts {
                println!("   ├─ {}: {}", processor, count);
            }
        }

        if !self.reports.is_empty() {
            println!("\n📤 Reports");
            for (kind, report) in &self.reports {
                println!(
                    "   ├─ {}: ticks={} published={} empty={} failed={} no_connector={} admission_timeouts={}",
                    kind,
                    report.ticks,
                    report.published,
                    report.empty,
                    report.failed,
                    report.no_connector,
                    report.admission_timeouts
                );
            }
        }

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_on_empty_run() {
        let stats = HubStats::default();
        assert_eq!(stats.throughput(), 0.0);
        assert_eq!(stats.drop_rate(), 0.0);
    }

    #[test]
    fn test_drop_rate() {
        let mut stats = HubStats::default();
        stats.ingestion.messages_received = 150;
        stats.ingestion.messages_dropped = 50;
        assert!((stats.drop_rate() - 25.0).abs() < f64::EPSILON);
    }
}
