//! Battery drain from many small background consumers.

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MetricSnapshot, NormalizedMetrics,
    ProcessSnapshot, Severity, SuggestedAction,
};

use super::{EvaluationContext, InsightRule};

const LOW_CPU: f64 = 0.5;
const HIGH_CPU: f64 = 5.0;
const MIN_PROCESSES: usize = 5;
const MIN_COMBINED: f64 = 10.0;

/// On battery with many non-system processes each trickling 0.5-5% CPU.
///
/// None of them shows up as a hog, but together they keep the CPU from
/// idling.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyInefficiencyRule;

impl InsightRule for EnergyInefficiencyRule {
    fn id(&self) -> &'static str {
        "energy_inefficiency"
    }

    fn name(&self) -> &'static str {
        "Energy Inefficiency"
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
        if !metrics.on_battery {
            return None;
        }

        let mut trickle: Vec<&ProcessSnapshot> = processes
            .iter()
            .filter(|p| !p.is_system && (LOW_CPU..=HIGH_CPU).contains(&p.cpu_usage))
            .collect();
        let combined: f64 = trickle.iter().map(|p| p.cpu_usage).sum();
        if trickle.len() <= MIN_PROCESSES || combined <= MIN_COMBINED {
            return None;
        }
        trickle.sort_by(|a, b| b.cpu_usage.total_cmp(&a.cpu_usage));

        let count = trickle.len();
        let names: Vec<String> = trickle.iter().take(5).map(|p| p.display_name.clone()).collect();

        let mut related = vec![
            MetricSnapshot::new("Background CPU", combined, "%").with_threshold(MIN_COMBINED),
            MetricSnapshot::new("Background Processes", count as f64, "count"),
        ];
        if let Some(battery) = metrics.battery_percent {
            related.push(MetricSnapshot::new("Battery", battery, "%"));
        }

        let insight = ExplainInsight::new(
            InsightType::EnergyInefficiency,
            Severity::Info,
            format!("{count} background apps are using {combined:.0}% CPU on battery"),
            "Many small background tasks keep the CPU from reaching low-power idle".to_string(),
            metrics.timestamp,
        )
        .with_explanation(
            "Each app looks harmless alone, but their wakeups add up and drain the battery \
             faster than a single busy app would.",
        )
        .with_confidence(0.6)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![
            SuggestedAction::new("Quit background apps you are not using"),
            SuggestedAction::new("Review energy impact").with_command("pmset -g assertions"),
        ])
        .with_affected_processes(names)
        .with_related_metrics(related);

        Some(insight)
    }
}
