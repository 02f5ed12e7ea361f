//! Metric-to-process attribution.
//!
//! For every metric above its relevance threshold, the engine ranks the top
//! candidate processes on the matching resource and records how much of the
//! observed total each one accounts for:
//!
//! | Metric | Relevant when | Candidate floor | Strength |
//! |---|---|---|---|
//! | CPU | cpu > 50% | process cpu > 10% | process cpu / total cpu |
//! | Memory | pressure ≠ normal | > 5% of total RAM | process bytes / used bytes |
//! | Disk | read or write > 50 MB/s | > 10 MB | process bytes / (read + write) |
//!
//! Strength is capped at 1.0 and the record is skipped when the divisor is 0.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sx_common::{
    MemoryPressure, MetricKind, NormalizedMetrics, ProcessCategory, ProcessSnapshot, BYTES_PER_MB,
};
use sx_config::CorrelationConfig;

/// An attributed link between an elevated metric and one process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricCorrelation {
    pub metric: MetricKind,
    pub metric_name: String,
    pub process: ProcessSnapshot,
    /// Share of the observed total, in [0, 1].
    pub strength: f64,
    pub description: String,
}

/// Ranks processes against elevated metrics.
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine {
    config: CorrelationConfig,
}

impl CorrelationEngine {
    pub fn new(config: CorrelationConfig) -> Self {
        Self { config }
    }

    /// Correlate every elevated metric in `metrics` with `processes`.
    pub fn correlate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Vec<MetricCorrelation> {
        let mut out = Vec::new();

        if metrics.cpu_usage > self.config.cpu_trigger_percent {
            out.extend(self.correlate_cpu(metrics, processes));
        }
        if metrics.memory_pressure != MemoryPressure::Normal {
            out.extend(self.correlate_memory(metrics, processes));
        }
        let trigger = self.config.disk_trigger_mb_per_sec;
        if metrics.disk_read_mb_per_sec() > trigger || metrics.disk_write_mb_per_sec() > trigger {
            out.extend(self.correlate_disk(metrics, processes));
        }

        out
    }

    fn correlate_cpu(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Vec<MetricCorrelation> {
        let total = metrics.cpu_usage;
        if total <= 0.0 {
            return Vec::new();
        }
        top_by(processes, self.config.max_candidates, |p| p.cpu_usage)
            .into_iter()
            .filter(|p| p.cpu_usage > self.config.min_process_cpu_percent)
            .map(|p| {
                let amount = format!("{:.0}% CPU", p.cpu_usage);
                build(MetricKind::CpuUsage, p, p.cpu_usage / total, &amount)
            })
            .collect()
    }

    fn correlate_memory(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Vec<MetricCorrelation> {
        let used = metrics.memory_used_bytes as f64;
        if used <= 0.0 {
            return Vec::new();
        }
        let floor = metrics.memory_total_bytes as f64 * self.config.min_process_memory_fraction;
        top_by(processes, self.config.max_candidates, |p| p.memory_bytes as f64)
            .into_iter()
            .filter(|p| p.memory_bytes as f64 > floor)
            .map(|p| {
                let amount = format!("{:.1} GB of memory", p.memory_gb());
                build(MetricKind::MemoryUsage, p, p.memory_bytes as f64 / used, &amount)
            })
            .collect()
    }

    fn correlate_disk(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Vec<MetricCorrelation> {
        let total = metrics.disk_read_bytes_per_sec + metrics.disk_write_bytes_per_sec;
        if total <= 0.0 {
            return Vec::new();
        }
        let floor = self.config.min_process_disk_mb * BYTES_PER_MB;
        top_by(processes, self.config.max_candidates, |p| p.disk_bytes as f64)
            .into_iter()
            .filter(|p| p.disk_bytes as f64 > floor)
            .map(|p| {
                let amount = format!("{:.0} MB/s of disk I/O", p.disk_mb());
                build(MetricKind::DiskIo, p, p.disk_bytes as f64 / total, &amount)
            })
            .collect()
    }
}

/// Up to `n` processes with the largest `key`, descending.
fn top_by<F>(processes: &[ProcessSnapshot], n: usize, key: F) -> Vec<&ProcessSnapshot>
where
    F: Fn(&ProcessSnapshot) -> f64,
{
    let mut ranked: Vec<&ProcessSnapshot> = processes.iter().collect();
    ranked.sort_by(|a, b| key(*b).total_cmp(&key(*a)));
    ranked.truncate(n);
    ranked
}

fn build(metric: MetricKind, process: &ProcessSnapshot, share: f64, amount: &str) -> MetricCorrelation {
    MetricCorrelation {
        metric,
        metric_name: metric.display_name().to_string(),
        process: process.clone(),
        strength: share.clamp(0.0, 1.0),
        description: describe(metric, process, amount),
    }
}

/// Category-aware explanation of why `process` drives `metric`.
fn describe(metric: MetricKind, process: &ProcessSnapshot, amount: &str) -> String {
    let name = &process.display_name;
    match (process.category, metric) {
        (ProcessCategory::Browser, MetricKind::MemoryUsage) => format!(
            "{name} is holding {amount}; every open tab keeps its own renderer in memory"
        ),
        (ProcessCategory::Browser, _) => format!(
            "{name} is using {amount}; busy tabs, video or heavy page scripts are the usual cause"
        ),
        (ProcessCategory::Developer, MetricKind::DiskIo) => format!(
            "{name} is moving {amount}, typical of a build writing artifacts or an indexer scanning sources"
        ),
        (ProcessCategory::Developer, _) => format!(
            "{name} is using {amount}, typical of a compile, test run or language server"
        ),
        (ProcessCategory::System, _) => format!(
            "{name} is a system process using {amount}; indexing, backups and updates cause short bursts"
        ),
        (ProcessCategory::AiMl, _) => format!(
            "{name} is running a model workload and using {amount}"
        ),
        (ProcessCategory::Container, _) => format!(
            "{name} is using {amount} on behalf of containers or a virtual machine"
        ),
        (ProcessCategory::Other, _) => format!("{name} is using {amount}"),
    }
}
