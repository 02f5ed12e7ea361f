//! sysexplain insight engine.
//!
//! Turns one telemetry sample plus a process list into a ranked set of
//! explained insights:
//! - [`correlation`]: attribute elevated metrics to processes
//! - [`anomaly`]: z-score detection against rolling history
//! - [`rules`]: pluggable diagnostic rules and audience bundles
//! - [`counterfactual`] and [`confidence`]: enhancement of rule output
//! - [`engine`]: the orchestrator with bounded histories
//! - [`shared`]: a lock-guarded handle for concurrent callers
//!
//! The engine does no I/O during analysis. Metric collection and rendering
//! belong to the caller.

pub mod anomaly;
pub mod confidence;
pub mod correlation;
pub mod counterfactual;
pub mod engine;
pub mod forecast;
pub mod history;
pub mod logging;
pub mod rules;
pub mod schema;
pub mod shared;

pub use anomaly::{AnomalyDetector, DetectedAnomaly};
pub use confidence::ConfidenceScorer;
pub use correlation::{CorrelationEngine, MetricCorrelation};
pub use counterfactual::CounterfactualAnalyzer;
pub use engine::InsightEngine;
pub use forecast::ThermalPrediction;
pub use history::BoundedHistory;
pub use rules::{EvaluationContext, InsightRule};
pub use shared::SharedInsightEngine;
