//! CPU throttle status.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::metrics::NormalizedMetrics;

/// Throttle status, either supplied by the caller or inferred from metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThrottleInfo {
    pub is_throttling: bool,
    /// Frequency reduction relative to the maximum clock, in percent.
    pub frequency_reduction_percent: f64,
    pub reason: String,
    pub detected_at: DateTime<Utc>,
}

impl ThrottleInfo {
    pub fn new(
        is_throttling: bool,
        frequency_reduction_percent: f64,
        reason: impl Into<String>,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            is_throttling,
            frequency_reduction_percent,
            reason: reason.into(),
            detected_at,
        }
    }

    /// Derive throttle status from the thermal state of a sample.
    ///
    /// Serious or critical thermal state counts as throttling. The reduction
    /// comes from the frequency ratio when the collector reports one.
    pub fn from_thermal_state(metrics: &NormalizedMetrics) -> Self {
        let is_throttling = metrics.thermal_state.is_throttling();
        let reduction = metrics
            .frequency_reduction_percent()
            .unwrap_or(0.0)
            .max(0.0);
        let reason = if is_throttling {
            format!("thermal state is {}", metrics.thermal_state)
        } else {
            "no thermal throttling".to_string()
        };
        Self::new(is_throttling, reduction, reason, metrics.timestamp)
    }
}
