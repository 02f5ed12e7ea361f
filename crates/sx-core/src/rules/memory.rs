//! Memory pressure rule.

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MemoryPressure, MetricKind,
    MetricSnapshot, NormalizedMetrics, ProcessSnapshot, Severity, SuggestedAction,
};

use super::{display_names, top_processes, EvaluationContext, InsightRule};

/// The OS reports memory pressure above normal.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryPressureRule;

impl InsightRule for MemoryPressureRule {
    fn id(&self) -> &'static str {
        "memory_pressure"
    }

    fn name(&self) -> &'static str {
        "Memory Pressure"
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
        let severity = match metrics.memory_pressure {
            MemoryPressure::Normal => return None,
            MemoryPressure::Warning => Severity::Warning,
            MemoryPressure::Critical => Severity::Critical,
        };

        let top = top_processes(processes, 3, |p| p.memory_bytes as f64);
        let leader = top.first().copied();

        let root_cause = match leader {
            Some(p) => format!("{} is holding {:.1} GB of memory", p.display_name, p.memory_gb()),
            None => "Open apps together need more memory than is installed".to_string(),
        };

        let mut explanation = match leader
            .and_then(|p| context.correlation_for(MetricKind::MemoryUsage, p.pid))
        {
            Some(c) => format!("{}.", c.description),
            None => "The system is compressing memory to make room.".to_string(),
        };
        if metrics.swap_used_bytes > 0 {
            explanation.push_str(&format!(
                " {:.1} GB has been swapped to disk, which makes switching apps slow.",
                metrics.swap_used_gb()
            ));
        }

        let mut actions = Vec::new();
        if let Some(p) = leader {
            actions.push(SuggestedAction::new(format!(
                "Close windows or tabs in {}",
                p.display_name
            )));
        }
        actions.push(SuggestedAction::new("Review memory use per app").with_command("vm_stat"));

        let insight = ExplainInsight::new(
            InsightType::MemoryPressure,
            severity,
            format!(
                "Memory pressure is {} ({:.1} GB in use)",
                metrics.memory_pressure,
                metrics.memory_used_gb()
            ),
            root_cause,
            metrics.timestamp,
        )
        .with_explanation(explanation)
        .with_confidence(0.8)
        .with_safety(ActionSafety::Caution)
        .with_audience(self.audience())
        .with_actions(actions)
        .with_affected_processes(display_names(&top))
        .with_related_metrics(vec![
            MetricSnapshot::new("Memory Usage", metrics.memory_usage_percent, "%"),
            MetricSnapshot::new("Swap Used", metrics.swap_used_gb(), "GB"),
        ]);

        Some(insight)
    }
}
