//! CPU saturation and P/E core scheduling rules.

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MetricKind, MetricSnapshot,
    NormalizedMetrics, ProcessSnapshot, Severity, SuggestedAction,
};

use super::{display_names, join_names, top_processes, EvaluationContext, InsightRule};

const SATURATION_THRESHOLD: f64 = 80.0;
const SATURATION_CRITICAL: f64 = 95.0;

/// Overall CPU usage above 80%.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuSaturationRule;

impl InsightRule for CpuSaturationRule {
    fn id(&self) -> &'static str {
        "cpu_saturation"
    }

    fn name(&self) -> &'static str {
        "CPU Saturation"
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
        let cpu = metrics.cpu_usage;
        if cpu <= SATURATION_THRESHOLD {
            return None;
        }

        let severity = if cpu > SATURATION_CRITICAL {
            Severity::Critical
        } else {
            Severity::Warning
        };

        let top = top_processes(processes, 3, |p| p.cpu_usage);
        let leader = top.first().copied();
        let share = leader.map_or(0.0, |p| p.cpu_usage / cpu);

        let root_cause = match leader {
            Some(p) => format!("{} is using {:.0}% CPU", p.display_name, p.cpu_usage),
            None => "Many processes are competing for CPU time".to_string(),
        };

        let mut explanation = match leader
            .and_then(|p| context.correlation_for(MetricKind::CpuUsage, p.pid))
        {
            Some(c) => format!("{}.", c.description),
            None => "The processor has little headroom left, so apps respond slowly.".to_string(),
        };
        if top.len() > 1 {
            explanation.push_str(&format!(
                " Top consumers: {}.",
                join_names(&display_names(&top))
            ));
        }

        let mut actions = Vec::new();
        if let Some(p) = leader {
            actions.push(
                SuggestedAction::new(format!("Quit or pause {}", p.display_name))
                    .with_command(format!("kill -STOP {}", p.pid)),
            );
        }
        actions.push(
            SuggestedAction::new("Inspect CPU consumers").with_command("top -o cpu -n 10"),
        );

        let insight = ExplainInsight::new(
            InsightType::CpuSaturation,
            severity,
            format!("CPU usage is at {cpu:.0}%"),
            root_cause,
            metrics.timestamp,
        )
        .with_explanation(explanation)
        .with_confidence(if share > 0.5 { 0.85 } else { 0.7 })
        .with_safety(ActionSafety::Caution)
        .with_audience(self.audience())
        .with_actions(actions)
        .with_affected_processes(display_names(&top))
        .with_related_metrics(vec![
            MetricSnapshot::new("CPU Usage", cpu, "%").with_threshold(SATURATION_THRESHOLD)
        ]);

        Some(insight)
    }
}

/// Work landing on the wrong core cluster.
///
/// Two shapes are reported: efficiency cores pinned while performance cores
/// idle (a background QoS bottleneck), and performance cores busy on a light
/// total load (work that could run on the efficiency cluster).
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreImbalanceRule;

impl InsightRule for CoreImbalanceRule {
    fn id(&self) -> &'static str {
        "core_imbalance"
    }

    fn name(&self) -> &'static str {
        "Core Imbalance"
    }

    fn audience(&self) -> Audience {
        Audience::Power
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        _context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        let p_avg = metrics.avg_p_core_usage()?;
        let e_avg = metrics.avg_e_core_usage()?;
        let cpu = metrics.cpu_usage;

        let bottleneck = p_avg < 30.0 && e_avg > 60.0 && cpu > 50.0;
        let inefficient = p_avg > 70.0 && e_avg < 20.0 && cpu < 50.0;

        let (severity, symptom, root_cause, explanation, confidence) = if bottleneck {
            (
                Severity::Warning,
                format!("Efficiency cores at {e_avg:.0}% while performance cores sit at {p_avg:.0}%"),
                "Work is scheduled as background priority and stuck on the efficiency cores"
                    .to_string(),
                "The scheduler keeps low-QoS threads on the efficiency cluster even when the \
                 performance cores are free, so heavy background work runs slower than it could."
                    .to_string(),
                0.6,
            )
        } else if inefficient {
            (
                Severity::Info,
                format!("Performance cores at {p_avg:.0}% on a light {cpu:.0}% total load"),
                "Light work is running on the performance cores".to_string(),
                "A few busy threads keep the performance cluster awake while the efficiency \
                 cores idle, which costs power without making the system faster."
                    .to_string(),
                0.5,
            )
        } else {
            return None;
        };

        let top = top_processes(processes, 3, |p| p.cpu_usage);

        let insight = ExplainInsight::new(
            InsightType::CoreImbalance,
            severity,
            symptom,
            root_cause,
            metrics.timestamp,
        )
        .with_explanation(explanation)
        .with_confidence(confidence)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![SuggestedAction::new(
            "Check the QoS class of the busiest threads",
        )
        .with_command("taskinfo --threads")])
        .with_affected_processes(display_names(&top))
        .with_related_metrics(vec![
            MetricSnapshot::new("P-core Usage", p_avg, "%"),
            MetricSnapshot::new("E-core Usage", e_avg, "%"),
            MetricSnapshot::new("CPU Usage", cpu, "%"),
        ]);

        Some(insight)
    }
}
