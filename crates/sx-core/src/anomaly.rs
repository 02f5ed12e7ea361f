//! Z-score anomaly detection against each metric's own rolling window.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sx_common::{MetricKind, NormalizedMetrics};
use sx_config::AnomalyConfig;
use sx_math::RollingSummary;

/// Metrics checked on every pass, in output order.
const CHECKED: [MetricKind; 4] = [
    MetricKind::CpuUsage,
    MetricKind::MemoryUsage,
    MetricKind::CpuTemperature,
    MetricKind::DiskIo,
];

/// A metric whose current value sits outside its recent distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedAnomaly {
    pub metric: MetricKind,
    pub metric_name: String,
    pub current_value: f64,
    /// Mean of the historical window.
    pub expected_value: f64,
    /// Signed deviation in standard-deviation units.
    pub deviation: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Compare `metrics` with the distribution of `history`.
    ///
    /// The engine passes its metrics history with the current sample already
    /// appended. Returns nothing until `min_samples` samples have accumulated. Metrics
    /// with a flat history are skipped.
    pub fn detect(
        &self,
        metrics: &NormalizedMetrics,
        history: &[NormalizedMetrics],
    ) -> Vec<DetectedAnomaly> {
        if history.len() < self.config.min_samples {
            return Vec::new();
        }

        CHECKED
            .iter()
            .filter_map(|&kind| self.check(kind, metrics, history))
            .collect()
    }

    fn check(
        &self,
        kind: MetricKind,
        metrics: &NormalizedMetrics,
        history: &[NormalizedMetrics],
    ) -> Option<DetectedAnomaly> {
        let current = kind.value_of(metrics)?;
        let values: Vec<f64> = history.iter().filter_map(|m| kind.value_of(m)).collect();
        let summary = RollingSummary::from_values(&values)?;
        let deviation = summary.z_score(current, self.config.min_std_dev)?;

        if deviation.abs() <= self.threshold_for(kind) {
            return None;
        }

        Some(DetectedAnomaly {
            metric: kind,
            metric_name: kind.display_name().to_string(),
            current_value: current,
            expected_value: summary.mean,
            deviation,
            timestamp: metrics.timestamp,
        })
    }

    fn threshold_for(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::CpuTemperature => self.config.temperature_z_threshold,
            _ => self.config.z_threshold,
        }
    }
}
