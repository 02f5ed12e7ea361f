//! Diagnostic rules.
//!
//! A rule is a stateless detector: it reads one metrics sample, the process
//! list and a shared [`EvaluationContext`], and returns at most one insight.
//! Rules never touch engine state; anything they remember comes from the
//! context's histories.
//!
//! Rules are grouped into bundles:
//! - [`default_rules`]: always installed (CPU, memory, I/O, thermal).
//! - [`rules_for`]: opt-in bundles for the developer and power-user audiences.

pub mod cpu;
pub mod developer;
pub mod io;
pub mod known;
pub mod memory;
pub mod power;
pub mod thermal;

pub use cpu::{CoreImbalanceRule, CpuSaturationRule};
pub use developer::{DevLoopRule, MlFallbackRule};
pub use io::{IoAmplificationRule, IoBottleneckRule};
pub use memory::MemoryPressureRule;
pub use power::EnergyInefficiencyRule;
pub use thermal::{SilentThrottleRule, ThermalForecastRule, ThermalThrottlingRule};

use sx_common::{
    Audience, ExplainInsight, MetricKind, NormalizedMetrics, ProcessSnapshot, ThrottleInfo,
};

use crate::anomaly::DetectedAnomaly;
use crate::correlation::MetricCorrelation;

/// Read-only inputs shared by every rule in one evaluation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationContext<'a> {
    /// Bounded metrics history, oldest first, including the current sample.
    pub metrics_history: &'a [NormalizedMetrics],
    pub anomalies: &'a [DetectedAnomaly],
    pub correlations: &'a [MetricCorrelation],
    /// The most recent past insights, oldest first.
    pub recent_insights: &'a [ExplainInsight],
    pub throttle: Option<&'a ThrottleInfo>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(metrics_history: &'a [NormalizedMetrics]) -> Self {
        Self {
            metrics_history,
            ..Default::default()
        }
    }

    pub fn with_anomalies(mut self, anomalies: &'a [DetectedAnomaly]) -> Self {
        self.anomalies = anomalies;
        self
    }

    pub fn with_correlations(mut self, correlations: &'a [MetricCorrelation]) -> Self {
        self.correlations = correlations;
        self
    }

    pub fn with_recent_insights(mut self, recent_insights: &'a [ExplainInsight]) -> Self {
        self.recent_insights = recent_insights;
        self
    }

    pub fn with_throttle(mut self, throttle: Option<&'a ThrottleInfo>) -> Self {
        self.throttle = throttle;
        self
    }

    /// CPU usage of the newest `n` history samples, oldest first.
    pub fn recent_cpu(&self, n: usize) -> Vec<f64> {
        let start = self.metrics_history.len().saturating_sub(n);
        self.metrics_history[start..]
            .iter()
            .map(|m| m.cpu_usage)
            .collect()
    }

    /// Every reported CPU temperature in the history, oldest first.
    pub fn temperatures(&self) -> Vec<f64> {
        self.metrics_history
            .iter()
            .filter_map(|m| m.cpu_temperature)
            .collect()
    }

    /// Correlation description recorded for `pid` on `metric`, if any.
    pub fn correlation_for(&self, metric: MetricKind, pid: u32) -> Option<&'a MetricCorrelation> {
        self.correlations
            .iter()
            .find(|c| c.metric == metric && c.process.pid == pid)
    }
}

/// A diagnostic detector.
pub trait InsightRule: Send + Sync {
    /// Stable identifier, e.g. `cpu_saturation`.
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Audience the produced insights target.
    fn audience(&self) -> Audience;

    /// Inspect one sample. Returns `None` when the rule does not apply.
    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight>;
}

/// The always-on rule set, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn InsightRule>> {
    vec![
        Box::new(CpuSaturationRule),
        Box::new(MemoryPressureRule),
        Box::new(IoBottleneckRule),
        Box::new(ThermalThrottlingRule),
    ]
}

/// The opt-in bundle for `audience`. `General` has no extra rules.
pub fn rules_for(audience: Audience) -> Vec<Box<dyn InsightRule>> {
    match audience {
        Audience::General => Vec::new(),
        Audience::Developer => vec![
            Box::new(CoreImbalanceRule),
            Box::new(DevLoopRule),
            Box::new(IoAmplificationRule),
            Box::new(MlFallbackRule),
        ],
        Audience::Power => vec![
            Box::new(CoreImbalanceRule),
            Box::new(SilentThrottleRule),
            Box::new(EnergyInefficiencyRule),
            Box::new(ThermalForecastRule),
        ],
    }
}

/// Up to `n` processes with a positive `key`, largest first.
pub(crate) fn top_processes<F>(processes: &[ProcessSnapshot], n: usize, key: F) -> Vec<&ProcessSnapshot>
where
    F: Fn(&ProcessSnapshot) -> f64,
{
    let mut ranked: Vec<&ProcessSnapshot> = processes.iter().filter(|p| key(*p) > 0.0).collect();
    ranked.sort_by(|a, b| key(*b).total_cmp(&key(*a)));
    ranked.truncate(n);
    ranked
}

pub(crate) fn display_names(processes: &[&ProcessSnapshot]) -> Vec<String> {
    processes.iter().map(|p| p.display_name.clone()).collect()
}

/// "a", "a and b", "a, b and c".
pub(crate) fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
