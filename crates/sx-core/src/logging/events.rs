//! Pipeline stages and stable event names for structured logs.

use serde::{Deserialize, Serialize};

/// Stages of one `analyze` pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Engine construction and rule registration.
    Init,
    /// Metric-to-process attribution.
    Correlate,
    /// Z-score anomaly detection.
    Detect,
    /// Rule evaluation.
    Evaluate,
    /// Counterfactual back-fill and confidence scoring.
    Enhance,
    /// Per-type deduplication and severity ordering.
    Dedup,
    /// Insight history bookkeeping.
    Record,
    /// Targeted single-question queries.
    Query,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Correlate => "correlate",
            Stage::Detect => "detect",
            Stage::Evaluate => "evaluate",
            Stage::Enhance => "enhance",
            Stage::Dedup => "dedup",
            Stage::Record => "record",
            Stage::Query => "query",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    pub const ENGINE_CREATED: &str = "engine.created";
    pub const RULES_REGISTERED: &str = "engine.rules_registered";

    pub const ANALYZE_STARTED: &str = "analyze.started";
    pub const ANALYZE_FINISHED: &str = "analyze.finished";

    pub const CORRELATIONS_FOUND: &str = "correlate.found";
    pub const ANOMALIES_FOUND: &str = "detect.found";

    pub const RULE_FIRED: &str = "evaluate.rule_fired";
    pub const CONFIDENCE_ADJUSTED: &str = "enhance.confidence_adjusted";
    pub const DUPLICATE_DROPPED: &str = "dedup.dropped";

    pub const HISTORY_RECORDED: &str = "record.recorded";
    pub const HISTORY_SUPPRESSED: &str = "record.suppressed";

    pub const QUERY_ANSWERED: &str = "query.answered";
}
