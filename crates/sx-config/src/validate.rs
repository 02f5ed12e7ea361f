//! Semantic validation for engine configuration.
//!
//! Serde already guarantees the shape; this checks that the values make
//! sense together (positive capacities, windows that fit, sane thresholds).

use thiserror::Error;

use crate::engine::EngineConfig;

/// Errors that can occur during semantic validation.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: String, value: f64 },

    #[error("history.recent_window ({window}) must not exceed history.insight_capacity ({capacity})")]
    RecentWindowTooLarge { window: usize, capacity: usize },

    #[error("{field} must be in (0, 1] (got {value:.4})")]
    FractionRange { field: String, value: f64 },

    #[error("anomaly.min_samples must be at least 2 (got {value})")]
    TooFewSamples { value: usize },

    #[error("unsupported schema version: expected {expected}, got {actual}")]
    SchemaVersion { expected: String, actual: String },
}

/// Validate an engine configuration.
pub fn validate_engine_config(config: &EngineConfig) -> Result<(), ValidationError> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::SchemaVersion {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let history = &config.history;
    positive_count("history.metrics_capacity", history.metrics_capacity)?;
    positive_count("history.insight_capacity", history.insight_capacity)?;
    positive_count("history.recent_window", history.recent_window)?;
    positive("history.recurrence_window_secs", history.recurrence_window_secs as f64)?;
    if history.recent_window > history.insight_capacity {
        return Err(ValidationError::RecentWindowTooLarge {
            window: history.recent_window,
            capacity: history.insight_capacity,
        });
    }

    let anomaly = &config.anomaly;
    if anomaly.min_samples < 2 {
        return Err(ValidationError::TooFewSamples {
            value: anomaly.min_samples,
        });
    }
    positive("anomaly.z_threshold", anomaly.z_threshold)?;
    positive("anomaly.temperature_z_threshold", anomaly.temperature_z_threshold)?;
    positive("anomaly.min_std_dev", anomaly.min_std_dev)?;

    let correlation = &config.correlation;
    positive_count("correlation.max_candidates", correlation.max_candidates)?;
    positive("correlation.cpu_trigger_percent", correlation.cpu_trigger_percent)?;
    positive(
        "correlation.disk_trigger_mb_per_sec",
        correlation.disk_trigger_mb_per_sec,
    )?;
    positive(
        "correlation.min_process_cpu_percent",
        correlation.min_process_cpu_percent,
    )?;
    positive("correlation.min_process_disk_mb", correlation.min_process_disk_mb)?;
    let frac = correlation.min_process_memory_fraction;
    if !(frac > 0.0 && frac <= 1.0) {
        return Err(ValidationError::FractionRange {
            field: "correlation.min_process_memory_fraction".to_string(),
            value: frac,
        });
    }

    Ok(())
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NonPositive {
            field: field.to_string(),
            value,
        })
    }
}

fn positive_count(field: &str, value: usize) -> Result<(), ValidationError> {
    positive(field, value as f64)
}
