//! "What if" projections for insights that lack one.
//!
//! Each generator derives its numbers from the same sample the rule saw, so
//! projections are point estimates, not measured outcomes.

use sx_common::{
    Counterfactual, ExplainInsight, InsightType, NormalizedMetrics, ProcessSnapshot,
};

use crate::rules::known::{is_dev_tool, is_ml_workload};
use crate::rules::thermal::THROTTLE_TEMPERATURE;

/// Back-fills [`Counterfactual`]s keyed by insight type.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterfactualAnalyzer;

impl CounterfactualAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Return `insight` with a counterfactual attached.
    ///
    /// Insights that already carry one, and types with no generator, come back
    /// unchanged.
    pub fn enhance(
        &self,
        insight: ExplainInsight,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> ExplainInsight {
        if insight.has_counterfactual() {
            return insight;
        }
        match self.generate(insight.insight_type, metrics, processes) {
            Some(cf) => insight.with_counterfactual(cf),
            None => insight,
        }
    }

    /// Build a counterfactual for `insight_type`, if one applies.
    pub fn generate(
        &self,
        insight_type: InsightType,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Option<Counterfactual> {
        match insight_type {
            InsightType::CpuSaturation => cpu(metrics, processes),
            InsightType::MemoryPressure => memory(metrics, processes),
            InsightType::ThermalThrottling | InsightType::SilentThrottling => {
                thermal(metrics, processes)
            }
            InsightType::IoBottleneck | InsightType::IoAmplification => io(metrics, processes),
            InsightType::DevLoopDetected => dev_loop(metrics, processes),
            InsightType::CoreImbalance => core_imbalance(metrics),
            InsightType::MlWorkloadFallback => ml_fallback(processes),
            _ => None,
        }
    }
}

fn top_by<F>(processes: &[ProcessSnapshot], key: F) -> Option<&ProcessSnapshot>
where
    F: Fn(&ProcessSnapshot) -> f64,
{
    processes
        .iter()
        .filter(|p| key(*p) > 0.0)
        .max_by(|a, b| key(*a).total_cmp(&key(*b)))
}

fn cpu(metrics: &NormalizedMetrics, processes: &[ProcessSnapshot]) -> Option<Counterfactual> {
    let current = metrics.cpu_usage;
    if current <= 0.0 {
        return None;
    }
    let top = top_by(processes, |p| p.cpu_usage)?;
    let share = top.cpu_usage.min(current);
    let projected = current - share;

    Some(
        Counterfactual::new(
            format!("Quit {}", top.display_name),
            format!("CPU usage drops from {current:.0}% to about {projected:.0}%"),
            (share / current).min(0.9),
        )
        .with_impact(format!("-{share:.0}% CPU"))
        .with_time_to_effect(2.0),
    )
}

fn memory(metrics: &NormalizedMetrics, processes: &[ProcessSnapshot]) -> Option<Counterfactual> {
    let used = metrics.memory_used_bytes as f64;
    if used <= 0.0 {
        return None;
    }
    let top = top_by(processes, |p| p.memory_bytes as f64)?;
    let freed = top.memory_gb();
    let fraction = (top.memory_bytes as f64 / used).min(1.0);
    let projected_percent = metrics.memory_usage_percent * (1.0 - fraction);

    Some(
        Counterfactual::new(
            format!("Quit {}", top.display_name),
            format!(
                "About {freed:.1} GB is freed and memory use falls to roughly {projected_percent:.0}%"
            ),
            fraction.min(0.85),
        )
        .with_impact(format!("-{freed:.1} GB"))
        .with_time_to_effect(5.0),
    )
}

/// Rough package temperature drop per percent of CPU removed, in °C.
const DEGREES_PER_CPU_PERCENT: f64 = 0.15;

fn thermal(metrics: &NormalizedMetrics, processes: &[ProcessSnapshot]) -> Option<Counterfactual> {
    let top = top_by(processes, |p| p.cpu_usage)?;
    let drop = top.cpu_usage.min(100.0) * DEGREES_PER_CPU_PERCENT;

    let outcome = match metrics.cpu_temperature {
        Some(temp) => {
            let projected = temp - drop;
            if projected < THROTTLE_TEMPERATURE {
                format!("Temperature falls from {temp:.0}°C to about {projected:.0}°C and full clock speed returns")
            } else {
                format!("Temperature falls from {temp:.0}°C to about {projected:.0}°C")
            }
        }
        None => "The chip cools and clock speeds recover".to_string(),
    };

    Some(
        Counterfactual::new(
            format!("Reduce the load from {}", top.display_name),
            outcome,
            0.6,
        )
        .with_impact(format!("-{drop:.0}°C"))
        .with_time_to_effect(90.0),
    )
}

fn io(metrics: &NormalizedMetrics, processes: &[ProcessSnapshot]) -> Option<Counterfactual> {
    let total = metrics.disk_total_mb_per_sec();
    if total <= 0.0 {
        return None;
    }
    let top = top_by(processes, |p| p.disk_bytes as f64)?;
    let moved = top.disk_mb().min(total);
    let projected = total - moved;

    Some(
        Counterfactual::new(
            format!("Pause {}", top.display_name),
            format!("Disk traffic drops from {total:.0} MB/s to about {projected:.0} MB/s"),
            (moved / total).min(0.85),
        )
        .with_impact(format!("-{moved:.0} MB/s"))
        .with_time_to_effect(3.0),
    )
}

fn dev_loop(metrics: &NormalizedMetrics, processes: &[ProcessSnapshot]) -> Option<Counterfactual> {
    let dev_cpu: f64 = processes
        .iter()
        .filter(|p| is_dev_tool(p))
        .map(|p| p.cpu_usage)
        .sum();
    if dev_cpu <= 0.0 {
        return None;
    }
    let saved = dev_cpu * 0.6;
    let projected = (metrics.cpu_usage - saved).max(0.0);

    Some(
        Counterfactual::new(
            "Ignore build output directories in the file watcher",
            format!("The rebuild loop stops and CPU settles near {projected:.0}%"),
            0.6,
        )
        .with_impact(format!("-{saved:.0}% CPU"))
        .with_time_to_effect(10.0),
    )
}

fn core_imbalance(metrics: &NormalizedMetrics) -> Option<Counterfactual> {
    let p_avg = metrics.avg_p_core_usage()?;
    let e_avg = metrics.avg_e_core_usage()?;
    let (action, outcome) = if e_avg > p_avg {
        (
            "Raise the priority of the background job",
            "Work moves onto the idle performance cores and finishes sooner",
        )
    } else {
        (
            "Run the light work at background priority",
            "Work moves to the efficiency cores and power draw falls",
        )
    };

    Some(
        Counterfactual::new(action, outcome, 0.5)
            .with_impact(format!("P {p_avg:.0}% / E {e_avg:.0}%"))
            .with_time_to_effect(5.0),
    )
}

fn ml_fallback(processes: &[ProcessSnapshot]) -> Option<Counterfactual> {
    let ml_cpu: f64 = processes
        .iter()
        .filter(|p| is_ml_workload(p))
        .map(|p| p.cpu_usage)
        .sum();
    if ml_cpu <= 0.0 {
        return None;
    }
    let saved = ml_cpu * 0.7;

    Some(
        Counterfactual::new(
            "Enable GPU (Metal) acceleration for the model runtime",
            format!("Inference moves to the GPU and frees about {saved:.0}% CPU"),
            0.55,
        )
        .with_impact(format!("-{saved:.0}% CPU"))
        .with_time_to_effect(30.0),
    )
}
