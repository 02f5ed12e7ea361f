//! End-to-end scenarios for the insight engine.

mod support;

use std::fs;

use support::{calm_at, process, t0, warming, with_cpu, GIB};
use sx_common::{
    Audience, ExplainInsight, InsightType, MemoryPressure, NormalizedMetrics, ProcessSnapshot,
    Severity, ThermalState, ThrottleInfo,
};
use sx_config::{ConfigResolution, ConfigResolver};
use sx_core::{
    AnomalyDetector, EvaluationContext, InsightEngine, InsightRule, SharedInsightEngine,
};
use tempfile::TempDir;

fn of_type(insights: &[ExplainInsight], kind: InsightType) -> Vec<&ExplainInsight> {
    insights.iter().filter(|i| i.insight_type == kind).collect()
}

#[test]
fn cpu_saturation_scenario() {
    let mut engine = InsightEngine::default();
    let metrics = NormalizedMetrics {
        cpu_usage: 96.0,
        ..calm_at(0)
    };
    let procs = vec![process(42, "encoder", 80.0)];

    let insights = engine.analyze(&metrics, &procs, None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);

    assert_eq!(cpu.len(), 1);
    assert_eq!(cpu[0].severity, Severity::Critical);
    assert_eq!(cpu[0].affected_processes, vec!["encoder"]);
    let cf = cpu[0].counterfactual.as_ref().expect("counterfactual back-filled");
    assert_eq!(cf.action, "Quit encoder");
}

#[test]
fn cpu_at_exactly_95_is_a_warning() {
    let mut engine = InsightEngine::default();
    let insights = engine.analyze(&with_cpu(calm_at(0), 95.0), &[process(1, "a", 80.0)], None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);
    assert_eq!(cpu.len(), 1);
    assert_eq!(cpu[0].severity, Severity::Warning);
}

#[test]
fn normal_state_has_no_critical_insights() {
    let mut engine = InsightEngine::default();
    engine.register_rules(Audience::Developer);
    engine.register_rules(Audience::Power);

    for i in 0..30 {
        let insights = engine.analyze(&calm_at(i), &[], None);
        assert!(
            insights.iter().all(|i| i.severity != Severity::Critical),
            "unexpected critical insight: {:?}",
            insights
        );
    }
}

#[test]
fn thermal_forecast_scenario() {
    let mut engine = InsightEngine::default();
    for sample in warming(15, 70.0, 1.5) {
        engine.analyze(&sample, &[], None);
    }

    let current = NormalizedMetrics {
        cpu_temperature: Some(82.0),
        thermal_state: ThermalState::Fair,
        ..calm_at(15)
    };
    let prediction = engine.thermal_forecast(&current);

    assert!(prediction.will_throttle, "{}", prediction.message);
    let minutes = prediction.minutes_to_throttle.expect("minutes projected");
    assert!((0.5..10.0).contains(&minutes));
    assert_eq!(prediction.current_temperature, Some(82.0));
}

#[test]
fn thermal_forecast_rule_fires_for_power_users() {
    let mut engine = InsightEngine::default();
    engine.register_rules(Audience::Power);
    for sample in warming(15, 70.0, 1.5) {
        engine.analyze(&sample, &[], None);
    }

    let current = NormalizedMetrics {
        cpu_temperature: Some(82.0),
        thermal_state: ThermalState::Fair,
        ..calm_at(15)
    };
    let insights = engine.analyze(&current, &[], None);
    let forecast = of_type(&insights, InsightType::ThermalForecast);
    assert_eq!(forecast.len(), 1);
    assert_eq!(forecast[0].severity, Severity::Info);
}

#[test]
fn thermal_forecast_needs_history() {
    let mut engine = InsightEngine::default();
    for sample in warming(5, 70.0, 1.5) {
        engine.analyze(&sample, &[], None);
    }
    assert!(!engine.thermal_forecast(&calm_at(5)).will_throttle);
}

#[test]
fn anomaly_detection_scenario() {
    let history: Vec<_> = (0..20)
        .map(|i| with_cpu(calm_at(i), if i % 2 == 0 { 25.0 } else { 35.0 }))
        .collect();
    let found = AnomalyDetector::default().detect(&with_cpu(calm_at(20), 95.0), &history);

    assert!(found.iter().any(|a| a.metric_name == "CPU Usage"));
}

#[test]
fn anomaly_detection_needs_ten_samples() {
    let history: Vec<_> = (0..9).map(|i| with_cpu(calm_at(i), 20.0 + i as f64)).collect();
    let found = AnomalyDetector::default().detect(&with_cpu(calm_at(9), 100.0), &history);
    assert!(found.is_empty());
}

#[test]
fn anomaly_raises_confidence_in_analyze() {
    let mut engine = InsightEngine::default();
    for i in 0..20 {
        engine.analyze(&with_cpu(calm_at(i), if i % 2 == 0 { 25.0 } else { 35.0 }), &[], None);
    }

    let procs = vec![process(7, "encoder", 80.0)];
    let insights = engine.analyze(&with_cpu(calm_at(20), 95.0), &procs, None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);

    assert_eq!(cpu.len(), 1);
    // 0.85 from the rule, blended with 80/95 correlation strength, plus the anomaly bonus.
    assert!(cpu[0].confidence > 0.9, "confidence {}", cpu[0].confidence);
    assert!(cpu[0].confidence <= 1.0);
}

#[test]
fn current_sample_counts_toward_anomaly_history() {
    let mut engine = InsightEngine::default();
    for i in 0..9 {
        engine.analyze(&with_cpu(calm_at(i), if i % 2 == 0 { 25.0 } else { 35.0 }), &[], None);
    }

    // Nine prior samples plus the spike itself make the ten needed.
    let procs = vec![process(7, "encoder", 80.0)];
    let insights = engine.analyze(&with_cpu(calm_at(9), 95.0), &procs, None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);

    assert_eq!(cpu.len(), 1);
    assert!(cpu[0].confidence > 0.9, "confidence {}", cpu[0].confidence);
}

#[test]
fn eight_prior_samples_are_not_enough_for_anomalies() {
    let mut engine = InsightEngine::default();
    for i in 0..8 {
        engine.analyze(&with_cpu(calm_at(i), if i % 2 == 0 { 25.0 } else { 35.0 }), &[], None);
    }

    let procs = vec![process(7, "encoder", 80.0)];
    let insights = engine.analyze(&with_cpu(calm_at(8), 95.0), &procs, None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);

    assert_eq!(cpu.len(), 1);
    // Rule confidence blended with the 80/95 correlation, no anomaly bonus.
    assert!(cpu[0].confidence < 0.9, "confidence {}", cpu[0].confidence);
}

#[test]
fn metrics_history_keeps_latest_sixty() {
    let mut engine = InsightEngine::default();
    for i in 0..75 {
        engine.analyze(&calm_at(i), &[], None);
    }

    let history = engine.metrics_history();
    assert_eq!(history.len(), 60);
    assert_eq!(history[0].timestamp, t0() + chrono::Duration::seconds(15));
    assert_eq!(history[59].timestamp, t0() + chrono::Duration::seconds(74));
}

#[test]
fn why_queries_do_not_touch_history() {
    let mut engine = InsightEngine::default();
    let hot = NormalizedMetrics {
        cpu_usage: 97.0,
        thermal_state: ThermalState::Serious,
        cpu_temperature: Some(96.0),
        ..calm_at(0)
    };
    let procs = vec![process(1, "renderer", 90.0)];
    engine.analyze(&hot, &procs, None);

    let metrics_before = engine.metrics_history().to_vec();
    let insights_before: Vec<_> = engine.insight_history().iter().map(|i| i.id).collect();

    let cpu = engine.why_cpu(&hot, &procs).expect("cpu answer");
    assert_eq!(cpu.insight_type, InsightType::CpuSaturation);
    assert!(cpu.has_counterfactual());

    let heat = engine.why_hot(&hot, &procs).expect("thermal answer");
    assert_eq!(heat.insight_type, InsightType::ThermalThrottling);
    assert_eq!(heat.severity, Severity::Warning);

    assert_eq!(engine.metrics_history(), metrics_before.as_slice());
    let insights_after: Vec<_> = engine.insight_history().iter().map(|i| i.id).collect();
    assert_eq!(insights_after, insights_before);
}

#[test]
fn why_cpu_is_none_when_idle() {
    let engine = InsightEngine::default();
    assert!(engine.why_cpu(&calm_at(0), &[]).is_none());
}

#[test]
fn duplicate_bundles_still_dedup() {
    let mut engine = InsightEngine::default();
    engine.register_rules(Audience::Developer);
    engine.register_rules(Audience::Developer);
    assert_eq!(engine.rule_count(), 12);

    let metrics = NormalizedMetrics {
        cpu_usage: 55.0,
        p_core_usage: vec![10.0, 15.0],
        e_core_usage: vec![85.0, 90.0],
        ..calm_at(0)
    };
    let insights = engine.analyze(&metrics, &[], None);
    assert_eq!(of_type(&insights, InsightType::CoreImbalance).len(), 1);
}

struct AlwaysCpu;

impl InsightRule for AlwaysCpu {
    fn id(&self) -> &'static str {
        "always_cpu"
    }

    fn name(&self) -> &'static str {
        "Always CPU"
    }

    fn audience(&self) -> Audience {
        Audience::General
    }

    fn evaluate(
        &self,
        metrics: &NormalizedMetrics,
        _processes: &[ProcessSnapshot],
        _context: &EvaluationContext<'_>,
    ) -> Option<ExplainInsight> {
        Some(ExplainInsight::new(
            InsightType::CpuSaturation,
            Severity::Info,
            "custom",
            "custom",
            metrics.timestamp,
        ))
    }
}

#[test]
fn first_rule_wins_dedup() {
    let mut engine = InsightEngine::default();
    engine.register_rule(Box::new(AlwaysCpu));

    let insights = engine.analyze(&with_cpu(calm_at(0), 90.0), &[], None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);
    assert_eq!(cpu.len(), 1);
    assert_eq!(cpu[0].severity, Severity::Warning);

    // With the built-in rule quiet, the custom rule's insight surfaces.
    let insights = engine.analyze(&calm_at(120), &[], None);
    let cpu = of_type(&insights, InsightType::CpuSaturation);
    assert_eq!(cpu.len(), 1);
    assert_eq!(cpu[0].symptom, "custom");
}

#[test]
fn output_is_ordered_by_severity() {
    let mut engine = InsightEngine::default();
    engine.register_rules(Audience::Power);

    let metrics = NormalizedMetrics {
        cpu_usage: 90.0,
        memory_pressure: MemoryPressure::Critical,
        memory_used_bytes: 15 * GIB,
        cpu_frequency_mhz: Some(2500.0),
        cpu_max_frequency_mhz: Some(3200.0),
        ..calm_at(0)
    };
    let insights = engine.analyze(&metrics, &[process(1, "x", 70.0)], None);

    assert!(insights.len() >= 3);
    assert_eq!(insights[0].insight_type, InsightType::MemoryPressure);
    for pair in insights.windows(2) {
        assert!(pair[0].severity >= pair[1].severity);
    }
}

#[test]
fn explicit_throttle_info_boosts_silent_throttle() {
    let mut engine = InsightEngine::default();
    engine.register_rules(Audience::Power);
    let info = ThrottleInfo::new(true, 40.0, "package power limit", t0());

    let insights = engine.analyze(&calm_at(0), &[process(1, "x", 20.0)], Some(&info));
    let silent = of_type(&insights, InsightType::SilentThrottling);
    assert_eq!(silent.len(), 1);
    assert_eq!(silent[0].severity, Severity::Warning);
    // 0.75 from the rule plus the throttle confirmation.
    assert!((silent[0].confidence - 0.9).abs() < 1e-9);
}

#[test]
fn analyze_process_reports_share() {
    let engine = InsightEngine::default();
    let big = ProcessSnapshot::new(9, "Xcode").with_cpu(60.0).with_memory(5 * GIB);
    let others = vec![big.clone(), process(10, "mail", 20.0)];
    let found = engine.analyze_process(&big, &with_cpu(calm_at(0), 80.0), &others);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].insight_type, InsightType::ProcessHighMemory);
    assert_eq!(found[0].severity, Severity::Critical);
    assert_eq!(found[1].insight_type, InsightType::ProcessHighCpu);
    assert_eq!(found[1].severity, Severity::Warning);
    assert!(found[1].explanation.contains("75%"));
}

#[test]
fn shared_engine_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(&path, r#"{"audiences": ["developer"]}"#).unwrap();

    let resolver = ConfigResolver::new(Some(path.clone()))
        .with_env_var("SYSEXPLAIN_CONFIG_TEST_UNSET_VAR")
        .with_config_home(None);
    let (shared, source) = SharedInsightEngine::from_resolver(&resolver).unwrap();

    assert_eq!(source.resolution, ConfigResolution::Explicit);
    assert_eq!(source.path, Some(path));
    assert_eq!(shared.rule_count(), 8);

    let insights = shared.analyze(&with_cpu(calm_at(0), 99.0), &[], None);
    assert_eq!(insights[0].insight_type, InsightType::CpuSaturation);
    assert_eq!(shared.insight_history().len(), 1);
}

#[test]
fn invalid_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(&path, r#"{"history": {"metrics_capacity": 0}}"#).unwrap();

    let err = SharedInsightEngine::from_resolver(&ConfigResolver::new(Some(path))).unwrap_err();
    assert_eq!(err.code(), 11);
}
