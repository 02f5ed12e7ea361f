//! Normalized metric samples.
//!
//! A [`NormalizedMetrics`] value is produced once per sampling tick by an
//! external collector and consumed read-only by every engine component.
//! Collector contract: percentages lie in [0, 100], byte counts and rates
//! are non-negative.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bytes per megabyte used for every MB/s figure in the engine.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// OS-reported thermal state (four levels).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ThermalState {
    #[default]
    Nominal,
    Fair,
    Serious,
    Critical,
}

impl ThermalState {
    /// Serious or critical: the OS is actively shedding heat.
    pub fn is_throttling(&self) -> bool {
        matches!(self, ThermalState::Serious | ThermalState::Critical)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThermalState::Nominal => "nominal",
            ThermalState::Fair => "fair",
            ThermalState::Serious => "serious",
            ThermalState::Critical => "critical",
        }
    }
}

impl std::fmt::Display for ThermalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// OS-reported memory pressure level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MemoryPressure {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemoryPressure::Normal => write!(f, "normal"),
            MemoryPressure::Warning => write!(f, "warning"),
            MemoryPressure::Critical => write!(f, "critical"),
        }
    }
}

/// Metrics the anomaly detector and correlation engine reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    CpuUsage,
    MemoryUsage,
    CpuTemperature,
    DiskIo,
}

impl MetricKind {
    /// Display name used in anomaly and correlation records.
    pub fn display_name(&self) -> &'static str {
        match self {
            MetricKind::CpuUsage => "CPU Usage",
            MetricKind::MemoryUsage => "Memory Usage",
            MetricKind::CpuTemperature => "CPU Temperature",
            MetricKind::DiskIo => "Disk I/O",
        }
    }

    /// Read this metric from a sample. Missing temperature reads as `None`.
    pub fn value_of(&self, metrics: &NormalizedMetrics) -> Option<f64> {
        match self {
            MetricKind::CpuUsage => Some(metrics.cpu_usage),
            MetricKind::MemoryUsage => Some(metrics.memory_usage_percent),
            MetricKind::CpuTemperature => metrics.cpu_temperature,
            MetricKind::DiskIo => Some(metrics.disk_total_mb_per_sec()),
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One normalized telemetry sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NormalizedMetrics {
    /// Capture time of the sample.
    pub timestamp: DateTime<Utc>,

    // CPU
    /// Whole-machine CPU utilisation (0-100).
    pub cpu_usage: f64,
    /// Per performance-core utilisation (0-100 each).
    pub p_core_usage: Vec<f64>,
    /// Per efficiency-core utilisation (0-100 each).
    pub e_core_usage: Vec<f64>,
    pub cpu_frequency_mhz: Option<f64>,
    pub cpu_max_frequency_mhz: Option<f64>,

    // Memory
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub memory_usage_percent: f64,
    pub swap_used_bytes: u64,
    pub memory_pressure: MemoryPressure,

    // Disk
    pub disk_read_bytes_per_sec: f64,
    pub disk_write_bytes_per_sec: f64,

    // Thermal
    pub cpu_temperature: Option<f64>,
    pub gpu_temperature: Option<f64>,
    pub thermal_state: ThermalState,

    // Power
    pub on_battery: bool,
    pub battery_percent: Option<f64>,
    pub power_watts: Option<f64>,

    // GPU / accelerators
    pub gpu_usage: Option<f64>,
    pub metal_active: bool,
    pub neural_engine_active: bool,

    // Network
    pub network_in_bytes_per_sec: f64,
    pub network_out_bytes_per_sec: f64,
}

impl Default for NormalizedMetrics {
    fn default() -> Self {
        Self {
            timestamp: Utc::now(),
            cpu_usage: 0.0,
            p_core_usage: Vec::new(),
            e_core_usage: Vec::new(),
            cpu_frequency_mhz: None,
            cpu_max_frequency_mhz: None,
            memory_used_bytes: 0,
            memory_total_bytes: 0,
            memory_usage_percent: 0.0,
            swap_used_bytes: 0,
            memory_pressure: MemoryPressure::Normal,
            disk_read_bytes_per_sec: 0.0,
            disk_write_bytes_per_sec: 0.0,
            cpu_temperature: None,
            gpu_temperature: None,
            thermal_state: ThermalState::Nominal,
            on_battery: false,
            battery_percent: None,
            power_watts: None,
            gpu_usage: None,
            metal_active: false,
            neural_engine_active: false,
            network_in_bytes_per_sec: 0.0,
            network_out_bytes_per_sec: 0.0,
        }
    }
}

impl NormalizedMetrics {
    pub fn disk_read_mb_per_sec(&self) -> f64 {
        self.disk_read_bytes_per_sec / BYTES_PER_MB
    }

    pub fn disk_write_mb_per_sec(&self) -> f64 {
        self.disk_write_bytes_per_sec / BYTES_PER_MB
    }

    /// Combined read + write throughput in MB/s.
    pub fn disk_total_mb_per_sec(&self) -> f64 {
        self.disk_read_mb_per_sec() + self.disk_write_mb_per_sec()
    }

    /// Mean P-core utilisation, `None` when the machine reports no P-cores.
    pub fn avg_p_core_usage(&self) -> Option<f64> {
        average(&self.p_core_usage)
    }

    /// Mean E-core utilisation, `None` when the machine reports no E-cores.
    pub fn avg_e_core_usage(&self) -> Option<f64> {
        average(&self.e_core_usage)
    }

    /// Frequency reduction implied by observed vs. maximum clock, in percent.
    pub fn frequency_reduction_percent(&self) -> Option<f64> {
        match (self.cpu_frequency_mhz, self.cpu_max_frequency_mhz) {
            (Some(current), Some(max)) if max > 0.0 => Some((1.0 - current / max) * 100.0),
            _ => None,
        }
    }

    pub fn memory_used_gb(&self) -> f64 {
        self.memory_used_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }

    pub fn swap_used_gb(&self) -> f64 {
        self.swap_used_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
