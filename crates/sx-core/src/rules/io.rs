//! Disk throughput rules.

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MetricKind, MetricSnapshot,
    NormalizedMetrics, ProcessSnapshot, Severity, SuggestedAction,
};
use sx_math::mean;

use super::{display_names, join_names, top_processes, EvaluationContext, InsightRule};

const BOTTLENECK_MB: f64 = 100.0;
const BOTTLENECK_CRITICAL_MB: f64 = 200.0;

/// Combined read and write throughput above 100 MB/s.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoBottleneckRule;

impl InsightRule for IoBottleneckRule {
    fn id(&self) -> &'static str {
        "io_bottleneck"
    }

    fn name(&self) -> &'static str {
        "I/O Bottleneck"
    }

    fn audience(&self) -> Audience {
        Audience::General
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        let total = metrics.disk_total_mb_per_sec();
        if total <= BOTTLENECK_MB {
            return None;
        }

        let severity = if total > BOTTLENECK_CRITICAL_MB {
            Severity::Critical
        } else {
            Severity::Warning
        };

        let top = top_processes(processes, 3, |p| p.disk_bytes as f64);
        let leader = top.first().copied();
        let share = leader.map_or(0.0, |p| p.disk_mb() / total);

        let root_cause = match leader {
            Some(p) => format!("{} is moving {:.0} MB/s", p.display_name, p.disk_mb()),
            None => "Sustained disk traffic from several processes".to_string(),
        };
        let explanation = match leader.and_then(|p| context.correlation_for(MetricKind::DiskIo, p.pid))
        {
            Some(c) => format!("{}.", c.description),
            None => format!(
                "The disk is reading {:.0} MB/s and writing {:.0} MB/s; apps that touch files will stall.",
                metrics.disk_read_mb_per_sec(),
                metrics.disk_write_mb_per_sec()
            ),
        };

        let insight = ExplainInsight::new(
            InsightType::IoBottleneck,
            severity,
            format!("Disk I/O is at {total:.0} MB/s"),
            root_cause,
            metrics.timestamp,
        )
        .with_explanation(explanation)
        .with_confidence(if share > 0.5 { 0.8 } else { 0.7 })
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![
            SuggestedAction::new("See which processes are using the disk").with_command("sudo fs_usage -f diskio"),
        ])
        .with_affected_processes(display_names(&top))
        .with_related_metrics(vec![
            MetricSnapshot::new("Disk Read", metrics.disk_read_mb_per_sec(), "MB/s"),
            MetricSnapshot::new("Disk Write", metrics.disk_write_mb_per_sec(), "MB/s"),
            MetricSnapshot::new("Disk I/O", total, "MB/s").with_threshold(BOTTLENECK_MB),
        ]);

        Some(insight)
    }
}

/// Reads outpacing writes by more than 10x over the last five samples.
///
/// Typical of a tool re-reading the same files for every small write, such
/// as a watcher rescanning a tree or a database without a warm cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct IoAmplificationRule;

const AMPLIFICATION_WINDOW: usize = 5;

impl InsightRule for IoAmplificationRule {
    fn id(&self) -> &'static str {
        "io_amplification"
    }

    fn name(&self) -> &'static str {
        "I/O Amplification"
    }

    fn audience(&self) -> Audience {
        Audience::Developer
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        let history = context.metrics_history;
        if history.len() < AMPLIFICATION_WINDOW {
            return None;
        }
        let window = &history[history.len() - AMPLIFICATION_WINDOW..];
        let reads: Vec<f64> = window.iter().map(|m| m.disk_read_mb_per_sec()).collect();
        let writes: Vec<f64> = window.iter().map(|m| m.disk_write_mb_per_sec()).collect();
        let avg_read = mean(&reads)?;
        let avg_write = mean(&writes)?;

        if avg_write <= 5.0 || avg_read <= avg_write * 10.0 {
            return None;
        }
        let ratio = avg_read / avg_write;

        let top = top_processes(processes, 3, |p| p.disk_bytes as f64);
        let names = display_names(&top);
        let root_cause = if names.is_empty() {
            "Files are being re-read far more often than they change".to_string()
        } else {
            format!("{} keeps re-reading files far more than it writes", join_names(&names))
        };

        let insight = ExplainInsight::new(
            InsightType::IoAmplification,
            Severity::Warning,
            format!("Reading {ratio:.0}x more data than is written"),
            root_cause,
            metrics.timestamp,
        )
        .with_explanation(format!(
            "Over the last {AMPLIFICATION_WINDOW} samples the disk averaged {avg_read:.0} MB/s of reads \
             for {avg_write:.1} MB/s of writes. Each small change is triggering a large rescan."
        ))
        .with_confidence(0.6)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![SuggestedAction::new(
            "Exclude build output and dependency folders from watchers and indexers",
        )])
        .with_affected_processes(names)
        .with_related_metrics(vec![
            MetricSnapshot::new("Average Read", avg_read, "MB/s"),
            MetricSnapshot::new("Average Write", avg_write, "MB/s").with_threshold(5.0),
        ]);

        Some(insight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sx_common::BYTES_PER_MB;

    fn disk(read_mb: f64, write_mb: f64) -> NormalizedMetrics {
        NormalizedMetrics {
            disk_read_bytes_per_sec: read_mb * BYTES_PER_MB,
            disk_write_bytes_per_sec: write_mb * BYTES_PER_MB,
            ..Default::default()
        }
    }

    #[test]
    fn test_bottleneck_severity() {
        let ctx = EvaluationContext::default();
        assert!(IoBottleneckRule.evaluate(&disk(60.0, 40.0), &[], &ctx).is_none());
        let warn = IoBottleneckRule.evaluate(&disk(90.0, 40.0), &[], &ctx).unwrap();
        assert_eq!(warn.severity, Severity::Warning);
        let crit = IoBottleneckRule.evaluate(&disk(150.0, 60.0), &[], &ctx).unwrap();
        assert_eq!(crit.severity, Severity::Critical);
    }

    #[test]
    fn test_amplification_needs_window() {
        let history: Vec<_> = (0..4).map(|_| disk(100.0, 6.0)).collect();
        let ctx = EvaluationContext::new(&history);
        assert!(IoAmplificationRule.evaluate(&history[3], &[], &ctx).is_none());
    }

    #[test]
    fn test_amplification_fires_on_read_heavy_window() {
        let history: Vec<_> = (0..6).map(|_| disk(100.0, 6.0)).collect();
        let ctx = EvaluationContext::new(&history);
        let insight = IoAmplificationRule.evaluate(&history[5], &[], &ctx).unwrap();
        assert_eq!(insight.insight_type, InsightType::IoAmplification);
        assert_eq!(insight.severity, Severity::Warning);
    }

    #[test]
    fn test_amplification_ignores_tiny_writes() {
        let history: Vec<_> = (0..6).map(|_| disk(100.0, 1.0)).collect();
        let ctx = EvaluationContext::new(&history);
        assert!(IoAmplificationRule.evaluate(&history[5], &[], &ctx).is_none());
    }
}
