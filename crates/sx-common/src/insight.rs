//! Insight value types.
//!
//! An [`ExplainInsight`] is the engine's output unit. Insights are built once
//! by a rule (or a targeted query) and then passed by value through the
//! enhancement steps; each `with_*` method consumes the insight and returns
//! the updated value, so nothing downstream observes a half-enhanced insight.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::InsightId;

/// Closed set of insight kinds. Deduplication keys on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    CpuSaturation,
    MemoryPressure,
    IoBottleneck,
    ThermalThrottling,
    CoreImbalance,
    DevLoopDetected,
    IoAmplification,
    MlWorkloadFallback,
    SilentThrottling,
    EnergyInefficiency,
    ThermalForecast,
    ProcessHighCpu,
    ProcessHighMemory,
}

impl InsightType {
    pub fn name(&self) -> &'static str {
        match self {
            InsightType::CpuSaturation => "cpu_saturation",
            InsightType::MemoryPressure => "memory_pressure",
            InsightType::IoBottleneck => "io_bottleneck",
            InsightType::ThermalThrottling => "thermal_throttling",
            InsightType::CoreImbalance => "core_imbalance",
            InsightType::DevLoopDetected => "dev_loop_detected",
            InsightType::IoAmplification => "io_amplification",
            InsightType::MlWorkloadFallback => "ml_workload_fallback",
            InsightType::SilentThrottling => "silent_throttling",
            InsightType::EnergyInefficiency => "energy_inefficiency",
            InsightType::ThermalForecast => "thermal_forecast",
            InsightType::ProcessHighCpu => "process_high_cpu",
            InsightType::ProcessHighMemory => "process_high_memory",
        }
    }

    /// Thermal-throttling or silent-throttling.
    pub fn is_throttle_related(&self) -> bool {
        matches!(
            self,
            InsightType::ThermalThrottling | InsightType::SilentThrottling
        )
    }
}

impl std::fmt::Display for InsightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Insight severity. Ordering is total: info < warning < critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// How risky it is to follow the insight's suggested actions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionSafety {
    #[default]
    Safe,
    Caution,
    Dangerous,
}

/// Intended reader of an insight. Also selects optional rule bundles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    General,
    Developer,
    Power,
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Audience::General => write!(f, "general"),
            Audience::Developer => write!(f, "developer"),
            Audience::Power => write!(f, "power"),
        }
    }
}

/// Projected outcome of a hypothetical corrective action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Counterfactual {
    pub action: String,
    pub expected_outcome: String,
    /// Quantified impact, e.g. "CPU 95% → 40%".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantified_impact: Option<String>,
    /// Confidence in the projection, in [0, 1].
    pub confidence: f64,
    /// Heuristic point estimate, not a measured outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_effect_secs: Option<f64>,
}

impl Counterfactual {
    pub fn new(action: impl Into<String>, expected_outcome: impl Into<String>, confidence: f64) -> Self {
        Self {
            action: action.into(),
            expected_outcome: expected_outcome.into(),
            quantified_impact: None,
            confidence: clamp_unit(confidence),
            time_to_effect_secs: None,
        }
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.quantified_impact = Some(impact.into());
        self
    }

    pub fn with_time_to_effect(mut self, secs: f64) -> Self {
        self.time_to_effect_secs = Some(secs);
        self
    }
}

/// A concrete step the user can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuggestedAction {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl SuggestedAction {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            command: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

/// A metric reading attached to an insight as supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricSnapshot {
    pub name: String,
    pub value: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl MetricSnapshot {
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            threshold: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// One structured finding about system health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExplainInsight {
    pub id: InsightId,
    pub timestamp: DateTime<Utc>,
    pub symptom: String,
    pub root_cause: String,
    pub explanation: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub insight_type: InsightType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterfactual: Option<Counterfactual>,
    pub action_safety: ActionSafety,
    pub audience: Audience,
    pub actions: Vec<SuggestedAction>,
    pub affected_processes: Vec<String>,
    pub related_metrics: Vec<MetricSnapshot>,
}

impl ExplainInsight {
    /// Start an insight. Confidence defaults to 0.5 until set.
    pub fn new(
        insight_type: InsightType,
        severity: Severity,
        symptom: impl Into<String>,
        root_cause: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InsightId::new(),
            timestamp,
            symptom: symptom.into(),
            root_cause: root_cause.into(),
            explanation: String::new(),
            confidence: 0.5,
            insight_type,
            severity,
            counterfactual: None,
            action_safety: ActionSafety::Safe,
            audience: Audience::General,
            actions: Vec::new(),
            affected_processes: Vec::new(),
            related_metrics: Vec::new(),
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    /// Set confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    pub fn with_counterfactual(mut self, counterfactual: Counterfactual) -> Self {
        self.counterfactual = Some(counterfactual);
        self
    }

    pub fn with_safety(mut self, safety: ActionSafety) -> Self {
        self.action_safety = safety;
        self
    }

    pub fn with_audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_actions(mut self, actions: Vec<SuggestedAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_affected_processes(mut self, names: Vec<String>) -> Self {
        self.affected_processes = names;
        self
    }

    pub fn with_related_metrics(mut self, metrics: Vec<MetricSnapshot>) -> Self {
        self.related_metrics = metrics;
        self
    }

    pub fn has_counterfactual(&self) -> bool {
        self.counterfactual.is_some()
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
