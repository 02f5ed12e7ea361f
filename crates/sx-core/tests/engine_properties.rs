//! Property-based tests for engine invariants.

mod support;

use std::collections::HashSet;

use proptest::prelude::*;
use support::{calm_at, GIB};
use sx_common::{
    Audience, InsightType, MemoryPressure, NormalizedMetrics, ProcessCategory, ProcessSnapshot,
    Severity, ThermalState,
};
use sx_core::InsightEngine;

fn pressure_strategy() -> impl Strategy<Value = MemoryPressure> {
    prop_oneof![
        Just(MemoryPressure::Normal),
        Just(MemoryPressure::Warning),
        Just(MemoryPressure::Critical),
    ]
}

fn thermal_strategy() -> impl Strategy<Value = ThermalState> {
    prop_oneof![
        Just(ThermalState::Nominal),
        Just(ThermalState::Fair),
        Just(ThermalState::Serious),
        Just(ThermalState::Critical),
    ]
}

fn metrics_strategy() -> impl Strategy<Value = NormalizedMetrics> {
    (
        0.0f64..=100.0,
        pressure_strategy(),
        thermal_strategy(),
        proptest::option::of(40.0f64..105.0),
        0.0f64..400.0,
        0.0f64..400.0,
        any::<bool>(),
        proptest::option::of((1000.0f64..3200.0, 3200.0f64..3600.0)),
    )
        .prop_map(
            |(cpu, pressure, thermal, temp, read_mb, write_mb, on_battery, freq)| {
                NormalizedMetrics {
                    cpu_usage: cpu,
                    memory_pressure: pressure,
                    thermal_state: thermal,
                    cpu_temperature: temp,
                    disk_read_bytes_per_sec: read_mb * 1_048_576.0,
                    disk_write_bytes_per_sec: write_mb * 1_048_576.0,
                    on_battery,
                    cpu_frequency_mhz: freq.map(|(f, _)| f),
                    cpu_max_frequency_mhz: freq.map(|(_, m)| m),
                    swap_used_bytes: if pressure == MemoryPressure::Normal { 0 } else { GIB },
                    ..calm_at(0)
                }
            },
        )
}

fn process_strategy() -> impl Strategy<Value = ProcessSnapshot> {
    (
        1u32..50_000,
        prop_oneof![
            Just("cargo"),
            Just("rustc"),
            Just("python3"),
            Just("Safari"),
            Just("kernel_task"),
            Just("ollama"),
        ],
        0.0f64..100.0,
        0u64..(6 * GIB),
        0u64..(500 * 1024 * 1024),
    )
        .prop_map(|(pid, name, cpu, mem, disk)| {
            ProcessSnapshot::new(pid, name)
                .with_category(ProcessCategory::classify(name))
                .with_cpu(cpu)
                .with_memory(mem)
                .with_disk(disk)
        })
}

fn full_engine() -> InsightEngine {
    let mut engine = InsightEngine::default();
    engine.register_rules(Audience::Developer);
    engine.register_rules(Audience::Power);
    engine
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn cpu_at_or_below_80_never_saturates(cpu in 0.0f64..=80.0) {
        let mut engine = InsightEngine::default();
        let metrics = NormalizedMetrics { cpu_usage: cpu, ..calm_at(0) };
        let insights = engine.analyze(&metrics, &[], None);
        prop_assert!(insights.iter().all(|i| i.insight_type != InsightType::CpuSaturation));
    }

    #[test]
    fn cpu_severity_follows_thresholds(cpu in 80.001f64..=100.0) {
        let mut engine = InsightEngine::default();
        let metrics = NormalizedMetrics { cpu_usage: cpu, ..calm_at(0) };
        let insights = engine.analyze(&metrics, &[], None);
        let found = insights
            .iter()
            .find(|i| i.insight_type == InsightType::CpuSaturation)
            .expect("cpu saturation above 80%");
        let expected = if cpu > 95.0 { Severity::Critical } else { Severity::Warning };
        prop_assert_eq!(found.severity, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// One insight per type, critical first, confidence in range.
    #[test]
    fn analyze_output_is_well_formed(
        metrics in metrics_strategy(),
        processes in prop::collection::vec(process_strategy(), 0..12),
    ) {
        let mut engine = full_engine();
        let insights = engine.analyze(&metrics, &processes, None);

        let mut seen = HashSet::new();
        for insight in &insights {
            prop_assert!(seen.insert(insight.insight_type), "duplicate {:?}", insight.insight_type);
            prop_assert!(
                (0.1..=1.0).contains(&insight.confidence),
                "confidence {} out of range for {:?}",
                insight.confidence,
                insight.insight_type
            );
        }
        for pair in insights.windows(2) {
            prop_assert!(pair[0].severity >= pair[1].severity);
        }
    }

    #[test]
    fn history_never_exceeds_capacity(samples in prop::collection::vec(metrics_strategy(), 1..90)) {
        let mut engine = full_engine();
        for (i, sample) in samples.iter().enumerate() {
            let mut sample = sample.clone();
            sample.timestamp = calm_at(i as i64).timestamp;
            engine.analyze(&sample, &[], None);
            prop_assert!(engine.metrics_history().len() <= 60);
            prop_assert!(engine.insight_history().len() <= 100);
        }
        prop_assert_eq!(engine.metrics_history().len(), samples.len().min(60));
    }

    #[test]
    fn why_queries_are_read_only(
        metrics in metrics_strategy(),
        processes in prop::collection::vec(process_strategy(), 0..8),
    ) {
        let mut engine = InsightEngine::default();
        engine.analyze(&calm_at(0), &processes, None);
        let before = engine.metrics_history().len();
        let recorded = engine.insight_history().len();

        let _ = engine.why_cpu(&metrics, &processes);
        let _ = engine.why_hot(&metrics, &processes);

        prop_assert_eq!(engine.metrics_history().len(), before);
        prop_assert_eq!(engine.insight_history().len(), recorded);
    }
}
