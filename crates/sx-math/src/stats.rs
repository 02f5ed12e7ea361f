//! Summary statistics over small rolling windows.
//!
//! All functions are total: empty input yields `None` rather than NaN.

use serde::Serialize;

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by n, not n - 1).
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation.
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

/// Mean and population standard deviation of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl RollingSummary {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let std_dev = population_std_dev(values)?;
        Some(Self {
            count: values.len(),
            mean,
            std_dev,
        })
    }

    /// Deviation of `value` in standard-deviation units.
    ///
    /// Returns `None` when the spread is at or below `min_std_dev`, where the
    /// ratio would be meaningless.
    pub fn z_score(&self, value: f64, min_std_dev: f64) -> Option<f64> {
        z_score(value, self.mean, self.std_dev, min_std_dev)
    }
}

/// `(value - mean) / std_dev`, or `None` if `std_dev <= min_std_dev`.
pub fn z_score(value: f64, mean: f64, std_dev: f64, min_std_dev: f64) -> Option<f64> {
    if std_dev > min_std_dev {
        Some((value - mean) / std_dev)
    } else {
        None
    }
}
