//! JSON Schema generation for engine output types.
//!
//! Presentation layers (terminal UI, JSON exporters) can validate or generate
//! bindings for what the engine returns.

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::anomaly::DetectedAnomaly;
pub use crate::correlation::MetricCorrelation;
pub use crate::forecast::ThermalPrediction;
pub use sx_common::{
    Counterfactual, ExplainInsight, MetricSnapshot, NormalizedMetrics, ProcessSnapshot,
    SuggestedAction, ThrottleInfo,
};

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Engine output
        ("ExplainInsight", "One finding with cause, confidence and actions"),
        ("Counterfactual", "Projected outcome of a corrective action"),
        ("SuggestedAction", "A concrete step the user can take"),
        ("MetricSnapshot", "A metric value attached to an insight"),
        (
            "ThermalPrediction",
            "Minutes-to-throttle forecast from temperature history",
        ),
        // Intermediate results
        ("DetectedAnomaly", "Metric outside its rolling distribution"),
        ("MetricCorrelation", "Elevated metric attributed to a process"),
        // Inputs
        ("NormalizedMetrics", "One telemetry sample from the collector"),
        ("ProcessSnapshot", "One process from the process lister"),
        ("ThrottleInfo", "Measured or inferred throttle status"),
    ]
}

/// Generate JSON Schema for a type by name.
pub fn schema_for_type(type_name: &str) -> sx_common::Result<Value> {
    let schema = match type_name {
        "ExplainInsight" => schema_for!(ExplainInsight),
        "Counterfactual" => schema_for!(Counterfactual),
        "SuggestedAction" => schema_for!(SuggestedAction),
        "MetricSnapshot" => schema_for!(MetricSnapshot),
        "ThermalPrediction" => schema_for!(ThermalPrediction),
        "DetectedAnomaly" => schema_for!(DetectedAnomaly),
        "MetricCorrelation" => schema_for!(MetricCorrelation),
        "NormalizedMetrics" => schema_for!(NormalizedMetrics),
        "ProcessSnapshot" => schema_for!(ProcessSnapshot),
        "ThrottleInfo" => schema_for!(ThrottleInfo),
        _ => return Err(sx_common::Error::UnknownSchema(type_name.to_string())),
    };

    Ok(serde_json::to_value(schema)?)
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> sx_common::Result<BTreeMap<String, Value>> {
    available_schemas()
        .into_iter()
        .map(|(name, _)| Ok((name.to_string(), schema_for_type(name)?)))
        .collect()
}
