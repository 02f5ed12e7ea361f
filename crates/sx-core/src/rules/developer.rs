//! Developer workload rules.

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MetricSnapshot, NormalizedMetrics,
    ProcessSnapshot, Severity, SuggestedAction,
};
use sx_math::count_spikes;

use super::known::{is_dev_tool, is_ml_workload};
use super::{join_names, EvaluationContext, InsightRule};

const SPIKE_WINDOW: usize = 10;
const SPIKE_FACTOR: f64 = 1.3;

/// A watcher and build tool feeding each other.
///
/// Fires when dev tools are busy, the disk is being read hard and the CPU
/// history shows repeated short bursts rather than one long compile.
#[derive(Debug, Clone, Copy, Default)]
pub struct DevLoopRule;

impl InsightRule for DevLoopRule {
    fn id(&self) -> &'static str {
        "dev_loop"
    }

    fn name(&self) -> &'static str {
        "Dev Loop Detected"
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
        let tools: Vec<&ProcessSnapshot> = processes.iter().filter(|p| is_dev_tool(p)).collect();
        if tools.is_empty() {
            return None;
        }

        let combined_cpu: f64 = tools.iter().map(|p| p.cpu_usage).sum();
        let read_mb = metrics.disk_read_mb_per_sec();
        if combined_cpu <= 30.0 || read_mb <= 20.0 {
            return None;
        }

        let spikes = count_spikes(&context.recent_cpu(SPIKE_WINDOW), SPIKE_FACTOR);
        if spikes < 2 {
            return None;
        }

        let names: Vec<String> = tools.iter().map(|p| p.display_name.clone()).collect();
        let insight = ExplainInsight::new(
            InsightType::DevLoopDetected,
            Severity::Warning,
            format!("Repeated CPU bursts ({spikes} in the last {SPIKE_WINDOW} samples) from dev tools"),
            format!("{} appear to be rebuilding in a loop", join_names(&names)),
            metrics.timestamp,
        )
        .with_explanation(format!(
            "Dev tools are using {combined_cpu:.0}% CPU while reading {read_mb:.0} MB/s. A file \
             watcher is probably reacting to files the build itself writes."
        ))
        .with_confidence(0.65)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![
            SuggestedAction::new("Exclude build output directories from the file watcher"),
            SuggestedAction::new("Check watcher ignore rules").with_command("watchman watch-list"),
        ])
        .with_affected_processes(names)
        .with_related_metrics(vec![
            MetricSnapshot::new("Dev Tool CPU", combined_cpu, "%").with_threshold(30.0),
            MetricSnapshot::new("Disk Read", read_mb, "MB/s").with_threshold(20.0),
            MetricSnapshot::new("CPU Spikes", spikes as f64, "count").with_threshold(2.0),
        ]);

        Some(insight)
    }
}

/// Model inference running on the CPU because no accelerator is in use.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlFallbackRule;

impl InsightRule for MlFallbackRule {
    fn id(&self) -> &'static str {
        "ml_fallback"
    }

    fn name(&self) -> &'static str {
        "ML Workload Fallback"
    }

    fn audience(&self) -> Audience {
        Audience::Developer
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        _context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        if metrics.metal_active || metrics.neural_engine_active {
            return None;
        }

        let workloads: Vec<&ProcessSnapshot> =
            processes.iter().filter(|p| is_ml_workload(p)).collect();
        let combined_cpu: f64 = workloads.iter().map(|p| p.cpu_usage).sum();
        if workloads.is_empty() || combined_cpu <= 50.0 {
            return None;
        }

        let names: Vec<String> = workloads.iter().map(|p| p.display_name.clone()).collect();
        let insight = ExplainInsight::new(
            InsightType::MlWorkloadFallback,
            Severity::Warning,
            format!("ML workload using {combined_cpu:.0}% CPU with no GPU acceleration"),
            format!("{} is running inference on the CPU", join_names(&names)),
            metrics.timestamp,
        )
        .with_explanation(
            "Neither Metal nor the Neural Engine is active, so the model runs on general-purpose \
             cores. This is several times slower and much hotter than the accelerated path.",
        )
        .with_confidence(0.7)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![
            SuggestedAction::new("Enable the Metal / MPS backend in the runtime"),
            SuggestedAction::new("Check that the PyTorch build supports MPS")
                .with_command("python -c \"import torch; print(torch.backends.mps.is_available())\""),
        ])
        .with_affected_processes(names)
        .with_related_metrics(vec![
            MetricSnapshot::new("ML CPU", combined_cpu, "%").with_threshold(50.0),
            MetricSnapshot::new("GPU Usage", metrics.gpu_usage.unwrap_or(0.0), "%"),
        ]);

        Some(insight)
    }
}
