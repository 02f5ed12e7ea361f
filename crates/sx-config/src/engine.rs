//! Engine configuration types.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides. The defaults are the engine's documented behaviour.

use serde::{Deserialize, Serialize};
use sx_common::Audience;

/// Bounded-history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Metric samples retained (60 ≈ one minute at 1 Hz).
    pub metrics_capacity: usize,
    /// Insights retained.
    pub insight_capacity: usize,
    /// Most recent insights exposed to rules and the scorer.
    pub recent_window: usize,
    /// Same-type insights within this window are not re-recorded.
    pub recurrence_window_secs: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            metrics_capacity: 60,
            insight_capacity: 100,
            recent_window: 20,
            recurrence_window_secs: 60,
        }
    }
}

/// Z-score anomaly detector settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Minimum historical samples before any detection runs.
    pub min_samples: usize,
    /// Threshold in standard deviations.
    pub z_threshold: f64,
    /// Tighter threshold for temperature.
    pub temperature_z_threshold: f64,
    /// Spreads at or below this are treated as flat.
    pub min_std_dev: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_samples: 10,
            z_threshold: 2.0,
            temperature_z_threshold: 1.5,
            min_std_dev: 0.001,
        }
    }
}

/// Metric-to-process attribution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Candidates ranked per elevated metric.
    pub max_candidates: usize,
    /// CPU percent above which CPU is attributed.
    pub cpu_trigger_percent: f64,
    /// Disk MB/s (read or write) above which disk I/O is attributed.
    pub disk_trigger_mb_per_sec: f64,
    /// Minimum process CPU percent to be named.
    pub min_process_cpu_percent: f64,
    /// Minimum fraction of total memory to be named.
    pub min_process_memory_fraction: f64,
    /// Minimum process disk MB to be named.
    pub min_process_disk_mb: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_candidates: 5,
            cpu_trigger_percent: 50.0,
            disk_trigger_mb_per_sec: 50.0,
            min_process_cpu_percent: 10.0,
            min_process_memory_fraction: 0.05,
            min_process_disk_mb: 10.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub schema_version: String,
    pub history: HistoryConfig,
    pub anomaly: AnomalyConfig,
    pub correlation: CorrelationConfig,
    /// Extra rule bundles registered when the engine is built.
    pub audiences: Vec<Audience>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: crate::CONFIG_SCHEMA_VERSION.to_string(),
            history: HistoryConfig::default(),
            anomaly: AnomalyConfig::default(),
            correlation: CorrelationConfig::default(),
            audiences: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_audiences(mut self, audiences: Vec<Audience>) -> Self {
        self.audiences = audiences;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history.metrics_capacity, 60);
        assert_eq!(config.history.insight_capacity, 100);
        assert_eq!(config.history.recent_window, 20);
        assert_eq!(config.history.recurrence_window_secs, 60);
        assert_eq!(config.anomaly.min_samples, 10);
        assert_eq!(config.anomaly.z_threshold, 2.0);
        assert_eq!(config.anomaly.temperature_z_threshold, 1.5);
        assert_eq!(config.correlation.max_candidates, 5);
        assert!(config.audiences.is_empty());
    }

    #[test]
    fn test_partial_json() {
        let config =
            EngineConfig::from_json(r#"{"history": {"metrics_capacity": 120}, "audiences": ["developer"]}"#)
                .unwrap();
        assert_eq!(config.history.metrics_capacity, 120);
        assert_eq!(config.history.insight_capacity, 100);
        assert_eq!(config.audiences, vec![Audience::Developer]);
        assert_eq!(config.anomaly, AnomalyConfig::default());
    }
}
