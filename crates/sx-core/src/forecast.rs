//! Minutes-to-throttle projection over the metrics history.
//!
//! Uses the half-split trend of recent temperatures, which reacts faster than
//! the least-squares fit used by [`crate::rules::ThermalForecastRule`]. The two
//! can disagree on the same input.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sx_common::NormalizedMetrics;
use sx_math::{half_split_trend, mean};

use crate::rules::thermal::{SAMPLES_PER_MINUTE, THROTTLE_TEMPERATURE};

/// Samples needed before a forecast is attempted.
pub const MIN_FORECAST_SAMPLES: usize = 10;

/// Temperatures considered for the trend, newest last.
pub const FORECAST_WINDOW: usize = 20;

const MIN_AVERAGE_TEMPERATURE: f64 = 70.0;
const MIN_MINUTES: f64 = 0.5;

/// Result of [`forecast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThermalPrediction {
    pub will_throttle: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes_to_throttle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_temperature: Option<f64>,
    /// °C per sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_per_sample: Option<f64>,
    pub message: String,
}

impl ThermalPrediction {
    fn no_throttle(message: impl Into<String>) -> Self {
        Self {
            will_throttle: false,
            minutes_to_throttle: None,
            current_temperature: None,
            average_temperature: None,
            trend_per_sample: None,
            message: message.into(),
        }
    }
}

/// Project when `current` will reach the throttle temperature.
///
/// `history` is oldest first. The current temperature falls back to the newest
/// history reading when the sample has none.
pub fn forecast(history: &[NormalizedMetrics], current: &NormalizedMetrics) -> ThermalPrediction {
    if history.len() < MIN_FORECAST_SAMPLES {
        return ThermalPrediction::no_throttle(format!(
            "Not enough data: {} of {} samples collected",
            history.len(),
            MIN_FORECAST_SAMPLES
        ));
    }

    let temps: Vec<f64> = history.iter().filter_map(|m| m.cpu_temperature).collect();
    let recent = &temps[temps.len().saturating_sub(FORECAST_WINDOW)..];

    let (Some(average), Some(trend)) = (mean(recent), half_split_trend(recent)) else {
        return ThermalPrediction::no_throttle("No temperature readings available");
    };
    let Some(now) = current.cpu_temperature.or_else(|| recent.last().copied()) else {
        return ThermalPrediction::no_throttle("No temperature readings available");
    };

    let mut prediction = ThermalPrediction {
        will_throttle: false,
        minutes_to_throttle: None,
        current_temperature: Some(now),
        average_temperature: Some(average),
        trend_per_sample: Some(trend),
        message: String::new(),
    };

    if trend > 0.0 && average > MIN_AVERAGE_TEMPERATURE {
        let minutes =
            ((THROTTLE_TEMPERATURE - now) / (trend * SAMPLES_PER_MINUTE)).max(MIN_MINUTES);
        prediction.will_throttle = true;
        prediction.minutes_to_throttle = Some(minutes);
        prediction.message = format!(
            "Throttling expected in about {minutes:.1} minutes ({now:.0}°C, rising {trend:.2}°C per sample)"
        );
    } else if trend > 0.0 {
        prediction.message = format!("Temperature rising slowly from a {average:.0}°C average; no throttling expected");
    } else {
        prediction.message = format!("Temperature stable around {average:.0}°C; no throttling expected");
    }

    prediction
}
