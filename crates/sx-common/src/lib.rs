//! sysexplain common types, IDs, and errors.
//!
//! This crate provides foundational types shared by the insight engine:
//! - Normalized metric samples produced by an external collector
//! - Process snapshots and their classification categories
//! - Insight, counterfactual and throttle value types
//! - Common error types

pub mod error;
pub mod id;
pub mod insight;
pub mod metrics;
pub mod process;
pub mod throttle;

pub use error::{Error, Result};
pub use id::InsightId;
pub use insight::{
    ActionSafety, Audience, Counterfactual, ExplainInsight, InsightType, MetricSnapshot, Severity,
    SuggestedAction,
};
pub use metrics::{MemoryPressure, MetricKind, NormalizedMetrics, ThermalState, BYTES_PER_MB};
pub use process::{ProcessCategory, ProcessSnapshot};
pub use throttle::ThrottleInfo;
