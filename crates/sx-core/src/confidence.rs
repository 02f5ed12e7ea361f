//! Confidence adjustment from corroborating signals.
//!
//! Signals are applied in order:
//! 1. Average correlation strength of the processes the insight names, blended
//!    50/50 with the rule's own confidence.
//! 2. +0.10 when an anomaly on the insight's metric was detected this pass.
//! 3. +0.05 when more than three insights of the same type are in recent history.
//! 4. +0.15 when throttle info confirms throttling for a throttling insight.
//!
//! The result is clamped to [0.1, 1.0]. Changes of 0.05 or less are dropped.

use sx_common::{ExplainInsight, InsightType, MetricKind};

use crate::rules::EvaluationContext;

pub const MIN_CONFIDENCE: f64 = 0.1;
pub const MAX_CONFIDENCE: f64 = 1.0;

const ANOMALY_BONUS: f64 = 0.10;
const RECURRENCE_BONUS: f64 = 0.05;
const RECURRENCE_MIN_COUNT: usize = 3;
const THROTTLE_BONUS: f64 = 0.15;
const CHANGE_EPSILON: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Re-score `insight`. Returns it untouched when the change is negligible
    /// and the original value already lies in [0.1, 1.0].
    pub fn score(&self, insight: ExplainInsight, context: &EvaluationContext<'_>) -> ExplainInsight {
        let original = insight.confidence;
        let adjusted = self.adjusted_confidence(&insight, context);
        let in_range = (MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&original);

        if net_change(original, adjusted) > CHANGE_EPSILON || !in_range {
            insight.with_confidence(adjusted)
        } else {
            insight
        }
    }

    /// The clamped confidence after all four signals.
    pub fn adjusted_confidence(&self, insight: &ExplainInsight, context: &EvaluationContext<'_>) -> f64 {
        let mut confidence = insight.confidence;

        let strengths: Vec<f64> = context
            .correlations
            .iter()
            .filter(|c| {
                insight
                    .affected_processes
                    .iter()
                    .any(|name| *name == c.process.display_name || *name == c.process.name)
            })
            .map(|c| c.strength)
            .collect();
        if let Some(avg) = sx_math::mean(&strengths) {
            confidence = (confidence + avg) / 2.0;
        }

        if let Some(topic) = topic_metric(insight.insight_type) {
            if context.anomalies.iter().any(|a| a.metric == topic) {
                confidence += ANOMALY_BONUS;
            }
        }

        let recurrences = context
            .recent_insights
            .iter()
            .filter(|past| past.insight_type == insight.insight_type)
            .count();
        if recurrences > RECURRENCE_MIN_COUNT {
            confidence += RECURRENCE_BONUS;
        }

        if insight.insight_type.is_throttle_related()
            && context.throttle.is_some_and(|t| t.is_throttling)
        {
            confidence += THROTTLE_BONUS;
        }

        if confidence.is_nan() {
            return MIN_CONFIDENCE;
        }
        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    }
}

/// Absolute change rounded to 1e-6, so a bonus of exactly 0.05 never clears
/// the epsilon through float error.
fn net_change(original: f64, adjusted: f64) -> f64 {
    ((adjusted - original).abs() * 1e6).round() / 1e6
}

/// The metric whose anomaly corroborates an insight of this type.
pub fn topic_metric(insight_type: InsightType) -> Option<MetricKind> {
    match insight_type {
        InsightType::CpuSaturation
        | InsightType::CoreImbalance
        | InsightType::DevLoopDetected
        | InsightType::MlWorkloadFallback
        | InsightType::EnergyInefficiency
        | InsightType::ProcessHighCpu => Some(MetricKind::CpuUsage),
        InsightType::MemoryPressure | InsightType::ProcessHighMemory => Some(MetricKind::MemoryUsage),
        InsightType::ThermalThrottling
        | InsightType::SilentThrottling
        | InsightType::ThermalForecast => Some(MetricKind::CpuTemperature),
        InsightType::IoBottleneck | InsightType::IoAmplification => Some(MetricKind::DiskIo),
    }
}
