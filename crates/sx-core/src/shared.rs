//! Thread-safe handle to one engine.
//!
//! Every call takes the same lock, so two `analyze` calls from different
//! threads never interleave their history appends or rule registration.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sx_common::{Audience, ExplainInsight, NormalizedMetrics, ProcessSnapshot, ThrottleInfo};
use sx_config::{ConfigResolver, ConfigSource, EngineConfig};
use tracing::info;

use crate::engine::InsightEngine;
use crate::forecast::ThermalPrediction;
use crate::rules::InsightRule;

/// Cloneable, lock-guarded [`InsightEngine`].
#[derive(Debug, Clone)]
pub struct SharedInsightEngine {
    inner: Arc<Mutex<InsightEngine>>,
}

impl Default for SharedInsightEngine {
    fn default() -> Self {
        Self::from_engine(InsightEngine::default())
    }
}

impl SharedInsightEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_engine(InsightEngine::new(config))
    }

    pub fn from_engine(engine: InsightEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Load configuration through `resolver` and build an engine from it.
    pub fn from_resolver(resolver: &ConfigResolver) -> sx_common::Result<(Self, ConfigSource)> {
        let resolved = resolver.load()?;
        info!(
            resolution = ?resolved.source.resolution,
            hash = resolved.source.hash.as_deref().unwrap_or("-"),
            "engine configured"
        );
        Ok((Self::new(resolved.config), resolved.source))
    }

    /// Poisoned locks are recovered. Each mutation is a single push or extend.
    fn lock(&self) -> MutexGuard<'_, InsightEngine> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut InsightEngine) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn register_rules(&self, audience: Audience) {
        self.lock().register_rules(audience);
    }

    pub fn register_rule(&self, rule: Box<dyn InsightRule>) {
        self.lock().register_rule(rule);
    }

    pub fn analyze(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        throttle: Option<&ThrottleInfo>,
    ) -> Vec<ExplainInsight> {
        self.lock().analyze(metrics, processes, throttle)
    }

    pub fn why_cpu(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Option<ExplainInsight> {
        self.lock().why_cpu(metrics, processes)
    }

    pub fn why_hot(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Option<ExplainInsight> {
        self.lock().why_hot(metrics, processes)
    }

    pub fn analyze_process(
        &self,
        process: &ProcessSnapshot,
        metrics: &NormalizedMetrics,
        all_processes: &[ProcessSnapshot],
    ) -> Vec<ExplainInsight> {
        self.lock().analyze_process(process, metrics, all_processes)
    }

    pub fn thermal_forecast(&self, current: &NormalizedMetrics) -> ThermalPrediction {
        self.lock().thermal_forecast(current)
    }

    pub fn rule_count(&self) -> usize {
        self.lock().rule_count()
    }

    pub fn metrics_history_len(&self) -> usize {
        self.lock().metrics_history().len()
    }

    /// Copy of the recorded insights, oldest first.
    pub fn insight_history(&self) -> Vec<ExplainInsight> {
        self.lock().insight_history().to_vec()
    }
}
