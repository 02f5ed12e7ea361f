//! The insight engine: rule registry, rolling histories and the analysis
//! pipeline.
//!
//! One `analyze` pass runs:
//!
//! ```text
//! sample ──► history ──► correlate ─┐
//!                   └──► detect ────┼─► context ─► rules (registration order)
//!                                   │                │
//!                                   │      counterfactual ─► confidence
//!                                   │                │
//!                                   └──────► dedup by type ─► sort by severity ─► record
//! ```
//!
//! Rules only read the context. All engine state changes happen here, in
//! `analyze` and the `register_*` methods.

use std::collections::HashSet;
use std::fmt;

use sx_common::{
    ActionSafety, Audience, ExplainInsight, InsightType, MetricSnapshot, NormalizedMetrics,
    ProcessSnapshot, Severity, SuggestedAction, ThrottleInfo,
};
use sx_config::EngineConfig;
use tracing::{debug, info, trace};

use crate::anomaly::AnomalyDetector;
use crate::confidence::ConfidenceScorer;
use crate::correlation::CorrelationEngine;
use crate::counterfactual::CounterfactualAnalyzer;
use crate::forecast::{forecast, ThermalPrediction};
use crate::history::BoundedHistory;
use crate::logging::{event_names, generate_run_id, Stage};
use crate::rules::{
    default_rules, rules_for, CpuSaturationRule, EvaluationContext, InsightRule,
    ThermalThrottlingRule,
};

const GIB: u64 = 1024 * 1024 * 1024;
const PROCESS_CPU_WARNING: f64 = 50.0;
const PROCESS_CPU_CRITICAL: f64 = 80.0;
const PROCESS_MEMORY_WARNING: u64 = 2 * GIB;
const PROCESS_MEMORY_CRITICAL: u64 = 4 * GIB;

/// Stateful analysis engine.
///
/// Owned by the caller. Wrap it in [`crate::SharedInsightEngine`] to share it
/// across threads.
pub struct InsightEngine {
    config: EngineConfig,
    rules: Vec<Box<dyn InsightRule>>,
    metrics_history: BoundedHistory<NormalizedMetrics>,
    insight_history: BoundedHistory<ExplainInsight>,
    correlation: CorrelationEngine,
    anomaly: AnomalyDetector,
    counterfactual: CounterfactualAnalyzer,
    scorer: ConfidenceScorer,
    run_id: String,
}

impl fmt::Debug for InsightEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsightEngine")
            .field("run_id", &self.run_id)
            .field("rules", &self.rule_ids())
            .field("metrics_history", &self.metrics_history.len())
            .field("insight_history", &self.insight_history.len())
            .finish()
    }
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl InsightEngine {
    /// Build an engine with the default rules plus the bundles named in
    /// `config.audiences`.
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = Self {
            rules: Vec::new(),
            metrics_history: BoundedHistory::new(config.history.metrics_capacity),
            insight_history: BoundedHistory::new(config.history.insight_capacity),
            correlation: CorrelationEngine::new(config.correlation.clone()),
            anomaly: AnomalyDetector::new(config.anomaly.clone()),
            counterfactual: CounterfactualAnalyzer::new(),
            scorer: ConfidenceScorer::new(),
            run_id: generate_run_id(),
            config,
        };

        engine.register_default_rules();
        for audience in engine.config.audiences.clone() {
            engine.register_rules(audience);
        }

        info!(
            event = event_names::ENGINE_CREATED,
            stage = %Stage::Init,
            run_id = %engine.run_id,
            rules = engine.rules.len(),
            "insight engine created"
        );
        engine
    }

    /// Install the always-on rules. Called by [`InsightEngine::new`].
    pub fn register_default_rules(&mut self) {
        let rules = default_rules();
        self.install(rules, "default");
    }

    /// Append the rule bundle for `audience`.
    ///
    /// Appends unconditionally: registering the same audience twice evaluates
    /// its rules twice. Output stays one insight per type because of the
    /// per-type dedup.
    pub fn register_rules(&mut self, audience: Audience) {
        let rules = rules_for(audience);
        self.install(rules, &audience.to_string());
    }

    /// Append a custom rule. It is evaluated after everything already registered.
    pub fn register_rule(&mut self, rule: Box<dyn InsightRule>) {
        self.install(vec![rule], "custom");
    }

    fn install(&mut self, rules: Vec<Box<dyn InsightRule>>, bundle: &str) {
        let added = rules.len();
        self.rules.extend(rules);
        debug!(
            event = event_names::RULES_REGISTERED,
            stage = %Stage::Init,
            bundle,
            added,
            total = self.rules.len(),
            "rules registered"
        );
    }

    /// Run the full pipeline on one sample.
    ///
    /// Returns at most one insight per type, critical first. Pass `throttle`
    /// when the collector measured throttling directly.
    pub fn analyze(
        &mut self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        throttle: Option<&ThrottleInfo>,
    ) -> Vec<ExplainInsight> {
        debug!(
            event = event_names::ANALYZE_STARTED,
            run_id = %self.run_id,
            cpu = metrics.cpu_usage,
            processes = processes.len(),
            "analyze started"
        );

        let correlations = self.correlation.correlate(metrics, processes);
        trace!(
            event = event_names::CORRELATIONS_FOUND,
            stage = %Stage::Correlate,
            count = correlations.len(),
            "correlations found"
        );

        self.metrics_history.push(metrics.clone());

        let anomalies = self.anomaly.detect(metrics, self.metrics_history.as_slice());
        trace!(
            event = event_names::ANOMALIES_FOUND,
            stage = %Stage::Detect,
            count = anomalies.len(),
            "anomalies found"
        );

        let context = EvaluationContext::new(self.metrics_history.as_slice())
            .with_anomalies(&anomalies)
            .with_correlations(&correlations)
            .with_recent_insights(self.insight_history.tail(self.config.history.recent_window))
            .with_throttle(throttle);

        let produced = self.evaluate_rules(metrics, processes, &context);
        let mut insights = dedup_by_type(produced);
        sort_by_severity(&mut insights);

        self.record(&insights);

        debug!(
            event = event_names::ANALYZE_FINISHED,
            run_id = %self.run_id,
            insights = insights.len(),
            "analyze finished"
        );
        insights
    }

    fn evaluate_rules(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> Vec<ExplainInsight> {
        self.rules
            .iter()
            .filter_map(|rule| {
                let insight = rule.evaluate(metrics, processes, context)?;
                debug!(
                    event = event_names::RULE_FIRED,
                    stage = %Stage::Evaluate,
                    rule = rule.id(),
                    insight_type = %insight.insight_type,
                    severity = ?insight.severity,
                    "rule fired"
                );
                Some(self.enhance(insight, metrics, processes, context))
            })
            .collect()
    }

    fn enhance(
        &self,
        insight: ExplainInsight,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        context: &EvaluationContext<'_>,
    ) -> ExplainInsight {
        let insight = self.counterfactual.enhance(insight, metrics, processes);
        let before = insight.confidence;
        let scored = self.scorer.score(insight, context);
        if scored.confidence != before {
            trace!(
                event = event_names::CONFIDENCE_ADJUSTED,
                stage = %Stage::Enhance,
                insight_type = %scored.insight_type,
                before,
                after = scored.confidence,
                "confidence adjusted"
            );
        }
        scored
    }

    /// Append to insight history, skipping types already recorded within the
    /// recurrence window.
    fn record(&mut self, insights: &[ExplainInsight]) {
        let window = self.config.history.recurrence_window_secs;
        for insight in insights {
            let recent_duplicate = self.insight_history.iter().rev().any(|past| {
                past.insight_type == insight.insight_type
                    && (insight.timestamp - past.timestamp).num_seconds().abs() < window
            });

            if recent_duplicate {
                trace!(
                    event = event_names::HISTORY_SUPPRESSED,
                    stage = %Stage::Record,
                    insight_type = %insight.insight_type,
                    "recurring insight not recorded"
                );
                continue;
            }

            self.insight_history.push(insight.clone());
            trace!(
                event = event_names::HISTORY_RECORDED,
                stage = %Stage::Record,
                insight_type = %insight.insight_type,
                history = self.insight_history.len(),
                "insight recorded"
            );
        }
    }

    /// Why is the CPU busy? Runs only the CPU saturation rule.
    ///
    /// Reads history but never writes it.
    pub fn why_cpu(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Option<ExplainInsight> {
        let answer = self.query(&CpuSaturationRule, metrics, processes, None);
        self.log_query("why_cpu", answer.as_ref());
        answer
    }

    /// Why is the machine hot? Runs only the thermal throttling rule, with
    /// throttle status taken from the sample's thermal state.
    ///
    /// Reads history but never writes it.
    pub fn why_hot(
        &self,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
    ) -> Option<ExplainInsight> {
        let throttle = ThrottleInfo::from_thermal_state(metrics);
        let answer = self.query(&ThermalThrottlingRule, metrics, processes, Some(&throttle));
        self.log_query("why_hot", answer.as_ref());
        answer
    }

    fn query(
        &self,
        rule: &dyn InsightRule,
        metrics: &NormalizedMetrics,
        processes: &[ProcessSnapshot],
        throttle: Option<&ThrottleInfo>,
    ) -> Option<ExplainInsight> {
        let history = self.metrics_history.as_slice();
        let correlations = self.correlation.correlate(metrics, processes);
        let anomalies = self.anomaly.detect(metrics, history);
        let context = EvaluationContext::new(history)
            .with_anomalies(&anomalies)
            .with_correlations(&correlations)
            .with_recent_insights(self.insight_history.tail(self.config.history.recent_window))
            .with_throttle(throttle);

        rule.evaluate(metrics, processes, &context)
            .map(|insight| self.counterfactual.enhance(insight, metrics, processes))
    }

    fn log_query(&self, query: &str, answer: Option<&ExplainInsight>) {
        debug!(
            event = event_names::QUERY_ANSWERED,
            stage = %Stage::Query,
            query,
            found = answer.is_some(),
            "query answered"
        );
    }

    /// Process-scoped checks, independent of the rule registry.
    ///
    /// Flags CPU above 50% (critical above 80%) and memory above 2 GiB
    /// (critical above 4 GiB). Explanations give the process's share of
    /// everything in `all_processes`.
    pub fn analyze_process(
        &self,
        process: &ProcessSnapshot,
        metrics: &NormalizedMetrics,
        all_processes: &[ProcessSnapshot],
    ) -> Vec<ExplainInsight> {
        let mut insights = Vec::new();
        let only = std::slice::from_ref(process);

        if process.cpu_usage > PROCESS_CPU_WARNING {
            let severity = if process.cpu_usage > PROCESS_CPU_CRITICAL {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let total: f64 = all_processes.iter().map(|p| p.cpu_usage).sum();
            let share = percent_of(process.cpu_usage, total);

            let mut insight = ExplainInsight::new(
                InsightType::ProcessHighCpu,
                severity,
                format!("{} is using {:.0}% CPU", process.display_name, process.cpu_usage),
                format!("{} is the busiest {} process", process.display_name, process.category),
                metrics.timestamp,
            )
            .with_explanation(format!(
                "It accounts for {share:.0}% of the CPU used by all listed processes."
            ))
            .with_confidence(0.8)
            .with_safety(ActionSafety::Caution)
            .with_actions(vec![SuggestedAction::new(format!("Quit or pause {}", process.display_name))
                .with_command(format!("kill -STOP {}", process.pid))])
            .with_affected_processes(vec![process.display_name.clone()])
            .with_related_metrics(vec![MetricSnapshot::new("Process CPU", process.cpu_usage, "%")
                .with_threshold(PROCESS_CPU_WARNING)]);
            if let Some(cf) = self
                .counterfactual
                .generate(InsightType::CpuSaturation, metrics, only)
            {
                insight = insight.with_counterfactual(cf);
            }
            insights.push(insight);
        }

        if process.memory_bytes > PROCESS_MEMORY_WARNING {
            let severity = if process.memory_bytes > PROCESS_MEMORY_CRITICAL {
                Severity::Critical
            } else {
                Severity::Warning
            };
            let total: f64 = all_processes.iter().map(|p| p.memory_bytes as f64).sum();
            let share = percent_of(process.memory_bytes as f64, total);

            let mut insight = ExplainInsight::new(
                InsightType::ProcessHighMemory,
                severity,
                format!("{} is using {:.1} GB of memory", process.display_name, process.memory_gb()),
                format!("{} is holding a large working set", process.display_name),
                metrics.timestamp,
            )
            .with_explanation(format!(
                "It accounts for {share:.0}% of the memory used by all listed processes."
            ))
            .with_confidence(0.8)
            .with_safety(ActionSafety::Caution)
            .with_actions(vec![SuggestedAction::new(format!(
                "Restart {} to release memory",
                process.display_name
            ))])
            .with_affected_processes(vec![process.display_name.clone()])
            .with_related_metrics(vec![MetricSnapshot::new("Process Memory", process.memory_gb(), "GB")
                .with_threshold(2.0)]);
            if let Some(cf) = self
                .counterfactual
                .generate(InsightType::MemoryPressure, metrics, only)
            {
                insight = insight.with_counterfactual(cf);
            }
            insights.push(insight);
        }

        sort_by_severity(&mut insights);
        insights
    }

    /// Project minutes until thermal throttling from the metrics history.
    pub fn thermal_forecast(&self, current: &NormalizedMetrics) -> ThermalPrediction {
        forecast(self.metrics_history.as_slice(), current)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rule ids in evaluation order, duplicates included.
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Metrics history, oldest first.
    pub fn metrics_history(&self) -> &[NormalizedMetrics] {
        self.metrics_history.as_slice()
    }

    /// Recorded insights, oldest first.
    pub fn insight_history(&self) -> &[ExplainInsight] {
        self.insight_history.as_slice()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Keep the first insight of each type, preserving order.
pub fn dedup_by_type(insights: Vec<ExplainInsight>) -> Vec<ExplainInsight> {
    let mut seen = HashSet::new();
    insights
        .into_iter()
        .filter(|insight| {
            let first = seen.insert(insight.insight_type);
            if !first {
                trace!(
                    event = event_names::DUPLICATE_DROPPED,
                    stage = %Stage::Dedup,
                    insight_type = %insight.insight_type,
                    "duplicate insight dropped"
                );
            }
            first
        })
        .collect()
}

/// Critical first. Stable, so equal severities keep pipeline order.
pub fn sort_by_severity(insights: &mut [ExplainInsight]) {
    insights.sort_by(|a, b| b.severity.cmp(&a.severity));
}

fn percent_of(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        (part / total * 100.0).min(100.0)
    } else {
        100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use sx_common::{MemoryPressure, ThermalState};

    /// Records how many recent insights each evaluation saw.
    struct RecentWindowSpy(Arc<AtomicUsize>);

    impl InsightRule for RecentWindowSpy {
        fn id(&self) -> &'static str {
            "recent_window_spy"
        }

        fn name(&self) -> &'static str {
            "Recent Window Spy"
        }

        fn audience(&self) -> Audience {
            Audience::General
        }

        fn evaluate(
            &self,
            _metrics: &NormalizedMetrics,
            _processes: &[ProcessSnapshot],
            context: &EvaluationContext<'_>,
        ) -> Option<ExplainInsight> {
            self.0.store(context.recent_insights.len(), Ordering::SeqCst);
            None
        }
    }

    fn insight(kind: InsightType, severity: Severity) -> ExplainInsight {
        ExplainInsight::new(kind, severity, "s", "r", Utc::now())
    }

    #[test]
    fn test_new_installs_default_rules() {
        let engine = InsightEngine::default();
        assert_eq!(engine.rule_count(), 4);
        assert_eq!(engine.rule_ids()[0], "cpu_saturation");
        assert!(engine.metrics_history().is_empty());
    }

    #[test]
    fn test_config_audiences_register_bundles() {
        let config = EngineConfig::default().with_audiences(vec![Audience::Developer]);
        let engine = InsightEngine::new(config);
        assert_eq!(engine.rule_count(), 8);
    }

    #[test]
    fn test_register_rules_is_append_only() {
        let mut engine = InsightEngine::default();
        engine.register_rules(Audience::Power);
        engine.register_rules(Audience::Power);
        assert_eq!(engine.rule_count(), 12);
        engine.register_rules(Audience::General);
        assert_eq!(engine.rule_count(), 12);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let a = insight(InsightType::CpuSaturation, Severity::Warning);
        let b = insight(InsightType::CpuSaturation, Severity::Critical);
        let c = insight(InsightType::MemoryPressure, Severity::Info);
        let a_id = a.id;
        let out = dedup_by_type(vec![a, b, c]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, a_id);
    }

    #[test]
    fn test_sort_is_stable() {
        let w1 = insight(InsightType::CpuSaturation, Severity::Warning);
        let i1 = insight(InsightType::CoreImbalance, Severity::Info);
        let c1 = insight(InsightType::MemoryPressure, Severity::Critical);
        let w2 = insight(InsightType::IoBottleneck, Severity::Warning);
        let mut all = vec![w1.clone(), i1, c1, w2.clone()];
        sort_by_severity(&mut all);
        assert_eq!(all[0].severity, Severity::Critical);
        assert_eq!(all[1].id, w1.id);
        assert_eq!(all[2].id, w2.id);
        assert_eq!(all[3].severity, Severity::Info);
    }

    #[test]
    fn test_recurrence_suppression() {
        let mut engine = InsightEngine::default();
        let t0 = Utc::now();
        let pressured = |offset: i64| NormalizedMetrics {
            timestamp: t0 + Duration::seconds(offset),
            memory_pressure: MemoryPressure::Warning,
            ..Default::default()
        };

        assert_eq!(engine.analyze(&pressured(0), &[], None).len(), 1);
        assert_eq!(engine.analyze(&pressured(30), &[], None).len(), 1);
        assert_eq!(engine.insight_history().len(), 1);

        engine.analyze(&pressured(90), &[], None);
        assert_eq!(engine.insight_history().len(), 2);
    }

    #[test]
    fn test_recent_insights_capped_at_window() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut engine = InsightEngine::default();
        engine.register_rule(Box::new(RecentWindowSpy(Arc::clone(&seen))));
        let t0 = Utc::now();

        for i in 0..25 {
            let m = NormalizedMetrics {
                timestamp: t0 + Duration::seconds(i * 120),
                cpu_usage: 90.0,
                ..Default::default()
            };
            engine.analyze(&m, &[], None);
        }
        assert_eq!(engine.insight_history().len(), 25);
        // The 25th pass saw the 24 earlier insights, capped at the window.
        assert_eq!(seen.load(Ordering::SeqCst), 20);

        let latest = engine.insight_history().last().map(|i| i.id);
        let m = NormalizedMetrics {
            timestamp: t0 + Duration::seconds(25 * 120),
            ..Default::default()
        };
        engine.analyze(&m, &[], None);
        assert_eq!(seen.load(Ordering::SeqCst), 20);
        assert_eq!(engine.insight_history().last().map(|i| i.id), latest);
    }

    #[test]
    fn test_insight_history_bounded() {
        let mut config = EngineConfig::default();
        config.history.insight_capacity = 3;
        config.history.recent_window = 3;
        let mut engine = InsightEngine::new(config);
        let t0 = Utc::now();
        for i in 0..5 {
            let m = NormalizedMetrics {
                timestamp: t0 + Duration::seconds(i * 120),
                cpu_usage: 90.0,
                ..Default::default()
            };
            engine.analyze(&m, &[], None);
        }
        assert_eq!(engine.insight_history().len(), 3);
    }

    #[test]
    fn test_why_hot_uses_thermal_state() {
        let engine = InsightEngine::default();
        let hot = NormalizedMetrics {
            thermal_state: ThermalState::Critical,
            cpu_temperature: Some(99.0),
            ..Default::default()
        };
        let procs = vec![ProcessSnapshot::new(1, "renderer").with_cpu(70.0)];
        let answer = engine.why_hot(&hot, &procs).unwrap();
        assert_eq!(answer.severity, Severity::Critical);
        assert!(answer.has_counterfactual());

        let cool = NormalizedMetrics::default();
        assert!(engine.why_hot(&cool, &procs).is_none());
    }

    #[test]
    fn test_analyze_process_thresholds() {
        let engine = InsightEngine::default();
        let metrics = NormalizedMetrics {
            cpu_usage: 90.0,
            memory_used_bytes: 12 * GIB,
            ..Default::default()
        };
        let heavy = ProcessSnapshot::new(1, "java").with_cpu(85.0).with_memory(3 * GIB);
        let light = ProcessSnapshot::new(2, "mail").with_cpu(15.0).with_memory(GIB);
        let all = vec![heavy.clone(), light.clone()];

        let found = engine.analyze_process(&heavy, &metrics, &all);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].insight_type, InsightType::ProcessHighCpu);
        assert_eq!(found[0].severity, Severity::Critical);
        assert!(found[0].explanation.contains("85%"));
        assert_eq!(found[1].insight_type, InsightType::ProcessHighMemory);
        assert_eq!(found[1].severity, Severity::Warning);
        assert!(found[1].explanation.contains("75%"));

        assert!(engine.analyze_process(&light, &metrics, &all).is_empty());
    }
}
