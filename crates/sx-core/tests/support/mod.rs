//! Shared fixtures for sx-core integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use sx_common::{
    MemoryPressure, NormalizedMetrics, ProcessCategory, ProcessSnapshot, ThermalState,
};

pub const GIB: u64 = 1024 * 1024 * 1024;

/// Fixed start time so history timestamps are reproducible.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// A calm sample `secs` seconds after [`t0`].
pub fn calm_at(secs: i64) -> NormalizedMetrics {
    NormalizedMetrics {
        timestamp: t0() + Duration::seconds(secs),
        cpu_usage: 30.0,
        memory_used_bytes: 8 * GIB,
        memory_total_bytes: 16 * GIB,
        memory_usage_percent: 50.0,
        memory_pressure: MemoryPressure::Normal,
        thermal_state: ThermalState::Nominal,
        cpu_temperature: Some(55.0),
        ..Default::default()
    }
}

pub fn with_cpu(mut metrics: NormalizedMetrics, cpu: f64) -> NormalizedMetrics {
    metrics.cpu_usage = cpu;
    metrics
}

pub fn process(pid: u32, name: &str, cpu: f64) -> ProcessSnapshot {
    ProcessSnapshot::new(pid, name)
        .with_category(ProcessCategory::Other)
        .with_cpu(cpu)
}

/// `n` samples warming from `start` by `step` °C per sample, thermal state fair.
pub fn warming(n: usize, start: f64, step: f64) -> Vec<NormalizedMetrics> {
    (0..n)
        .map(|i| NormalizedMetrics {
            cpu_temperature: Some(start + step * i as f64),
            thermal_state: ThermalState::Fair,
            cpu_usage: 60.0,
            ..calm_at(i as i64)
        })
        .collect()
}
