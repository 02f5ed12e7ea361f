//! Thermal rules: active throttling, silent frequency loss and forecasts.

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MetricSnapshot, NormalizedMetrics,
    ProcessSnapshot, Severity, SuggestedAction, ThermalState,
};
use sx_math::least_squares_slope;

use super::{display_names, top_processes, EvaluationContext, InsightRule};

/// Temperature at which the package starts throttling, in °C.
pub const THROTTLE_TEMPERATURE: f64 = 90.0;

/// Samples per minute at the 1 Hz collection rate.
pub const SAMPLES_PER_MINUTE: f64 = 60.0;

/// Thermal state serious or critical.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalThrottlingRule;

impl InsightRule for ThermalThrottlingRule {
    fn id(&self) -> &'static str {
        "thermal_throttling"
    }

    fn name(&self) -> &'static str {
        "Thermal Throttling"
    }

    fn audience(&self) -> Audience {
        Audience::General
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        _context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        let severity = match metrics.thermal_state {
            ThermalState::Critical => Severity::Critical,
            ThermalState::Serious => Severity::Warning,
            ThermalState::Nominal | ThermalState::Fair => return None,
        };

        let top = top_processes(processes, 3, |p| p.cpu_usage);
        let root_cause = match top.first() {
            Some(p) => format!(
                "Sustained load from {} ({:.0}% CPU) is heating the chip",
                p.display_name, p.cpu_usage
            ),
            None => "Sustained load is heating the chip faster than it can cool".to_string(),
        };

        let mut explanation = format!(
            "The thermal state is {}, so the system is lowering clock speeds to shed heat.",
            metrics.thermal_state
        );
        if let Some(reduction) = metrics.frequency_reduction_percent().filter(|r| *r > 0.0) {
            explanation.push_str(&format!(" The CPU is running {reduction:.0}% below its maximum clock."));
        }

        let mut related = Vec::new();
        if let Some(temp) = metrics.cpu_temperature {
            related.push(
                MetricSnapshot::new("CPU Temperature", temp, "°C").with_threshold(THROTTLE_TEMPERATURE),
            );
        }
        related.push(MetricSnapshot::new("CPU Usage", metrics.cpu_usage, "%"));

        let insight = ExplainInsight::new(
            InsightType::ThermalThrottling,
            severity,
            format!("CPU is thermally throttling ({})", metrics.thermal_state),
            root_cause,
            metrics.timestamp,
        )
        .with_explanation(explanation)
        .with_confidence(0.85)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![
            SuggestedAction::new("Reduce sustained load or pause heavy jobs"),
            SuggestedAction::new("Keep the vents clear and use a hard surface"),
        ])
        .with_affected_processes(display_names(&top))
        .with_related_metrics(related);

        Some(insight)
    }
}

/// Clock reduction without a serious thermal state.
///
/// Uses caller-supplied throttle info when present; otherwise infers the
/// reduction from observed versus maximum frequency.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentThrottleRule;

impl InsightRule for SilentThrottleRule {
    fn id(&self) -> &'static str {
        "silent_throttle"
    }

    fn name(&self) -> &'static str {
        "Silent Throttle"
    }

    fn audience(&self) -> Audience {
        Audience::Power
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        let (reduction, reason, confidence) = match context.throttle {
            Some(info) => {
                if !info.is_throttling || info.frequency_reduction_percent <= 10.0 {
                    return None;
                }
                (info.frequency_reduction_percent, info.reason.clone(), 0.75)
            }
            None => {
                let reduction = metrics.frequency_reduction_percent()?;
                if reduction <= 15.0 || metrics.thermal_state == ThermalState::Critical {
                    return None;
                }
                (
                    reduction,
                    "observed clock is well below the maximum".to_string(),
                    0.55,
                )
            }
        };

        let severity = if reduction > 30.0 {
            Severity::Warning
        } else {
            Severity::Info
        };

        let top = top_processes(processes, 3, |p| p.cpu_usage);
        let mut related = vec![MetricSnapshot::new("Frequency Reduction", reduction, "%")];
        if let Some(freq) = metrics.cpu_frequency_mhz {
            related.push(MetricSnapshot::new("CPU Frequency", freq, "MHz"));
        }

        let insight = ExplainInsight::new(
            InsightType::SilentThrottling,
            severity,
            format!("CPU is running {reduction:.0}% below full speed"),
            format!("Clock speed is being held back: {reason}"),
            metrics.timestamp,
        )
        .with_explanation(
            "The system lowers clock speed before reporting a serious thermal state. Work \
             finishes slower even though nothing looks hot yet.",
        )
        .with_confidence(confidence)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![
            SuggestedAction::new("Check power mode and connect to power if on battery"),
            SuggestedAction::new("Inspect thermal pressure").with_command("sudo powermetrics --samplers thermal -n 1"),
        ])
        .with_affected_processes(display_names(&top))
        .with_related_metrics(related);

        Some(insight)
    }
}

/// Rising temperature projected to reach the throttle point within minutes.
///
/// Fits a least-squares slope over the history temperatures and projects
/// `(90 - current) / (slope * 60)` minutes ahead.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermalForecastRule;

const FORECAST_MIN_SAMPLES: usize = 10;
const FORECAST_MIN_SLOPE: f64 = 0.5;
const FORECAST_HORIZON_MINUTES: f64 = 10.0;

impl InsightRule for ThermalForecastRule {
    fn id(&self) -> &'static str {
        "thermal_forecast"
    }

    fn name(&self) -> &'static str {
        "Thermal Forecast"
    }

    fn audience(&self) -> Audience {
        Audience::Power
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        if context.metrics_history.len() < FORECAST_MIN_SAMPLES
            || metrics.thermal_state.is_throttling()
        {
            return None;
        }
        let current = metrics.cpu_temperature?;
        if current <= 70.0 || current >= THROTTLE_TEMPERATURE {
            return None;
        }

        let slope = least_squares_slope(&context.temperatures())?;
        if slope <= FORECAST_MIN_SLOPE {
            return None;
        }

        let minutes = (THROTTLE_TEMPERATURE - current) / (slope * SAMPLES_PER_MINUTE);
        if minutes <= 0.0 || minutes >= FORECAST_HORIZON_MINUTES {
            return None;
        }

        let top = top_processes(processes, 3, |p| p.cpu_usage);
        let insight = ExplainInsight::new(
            InsightType::ThermalForecast,
            Severity::Info,
            format!("CPU will likely throttle in about {minutes:.1} minutes"),
            format!("Temperature is climbing {slope:.1}°C per sample from {current:.0}°C"),
            metrics.timestamp,
        )
        .with_explanation(format!(
            "At the current rate the chip reaches {THROTTLE_TEMPERATURE:.0}°C soon, after which clock \
             speeds drop. Easing the load now avoids the slowdown."
        ))
        .with_confidence(0.6)
        .with_safety(ActionSafety::Safe)
        .with_audience(self.audience())
        .with_actions(vec![SuggestedAction::new(
            "Pause or defer heavy work until the temperature settles",
        )])
        .with_affected_processes(display_names(&top))
        .with_related_metrics(vec![
            MetricSnapshot::new("CPU Temperature", current, "°C").with_threshold(THROTTLE_TEMPERATURE),
            MetricSnapshot::new("Temperature Trend", slope, "°C/sample"),
        ]);

        Some(insight)
    }
}
