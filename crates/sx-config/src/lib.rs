//! sysexplain engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the engine config file
//! - Config resolution (explicit path → env → XDG → defaults)
//! - Semantic validation

pub mod engine;
pub mod resolve;
pub mod validate;

pub use engine::{AnomalyConfig, CorrelationConfig, EngineConfig, HistoryConfig};
pub use resolve::{ConfigError, ConfigResolution, ConfigResolver, ConfigSource, ResolvedConfig};
pub use validate::{validate_engine_config, ValidationError};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
