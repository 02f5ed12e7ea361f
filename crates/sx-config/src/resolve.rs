//! Configuration resolution for sysexplain.
//!
//! Implements deterministic config resolution order:
//! 1. Explicit path (e.g. a `--config` flag in the host application)
//! 2. Environment variable (`SYSEXPLAIN_CONFIG`)
//! 3. XDG default (`~/.config/sysexplain/engine.json`)
//! 4. Built-in defaults
//!
//! An explicit or environment path that does not exist is an error; a
//! missing XDG file silently falls through to defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::engine::EngineConfig;
use crate::validate::{validate_engine_config, ValidationError};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SYSEXPLAIN_CONFIG";

/// Directory name under the XDG config home.
const CONFIG_DIR_NAME: &str = "sysexplain";

/// File name inside the config directory.
const CONFIG_FILE_NAME: &str = "engine.json";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl From<ConfigError> for sx_common::Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io { source, .. } => sx_common::Error::Io(source),
            ConfigError::Parse { source, .. } => sx_common::Error::Json(source),
            ConfigError::Validation(v) => sx_common::Error::InvalidConfig(v.to_string()),
            other => sx_common::Error::Config(other.to_string()),
        }
    }
}

/// How a config source was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigResolution {
    Explicit,
    Environment,
    Xdg,
    Defaults,
}

/// Provenance of the loaded configuration.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file, or None if using defaults.
    pub path: Option<PathBuf>,
    /// SHA-256 hash of file contents, or None if defaults.
    pub hash: Option<String>,
    pub resolution: ConfigResolution,
}

/// A loaded, validated configuration with provenance.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: EngineConfig,
    pub source: ConfigSource,
}

/// Configuration resolver with deterministic resolution order.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    explicit_path: Option<PathBuf>,
    env_var: String,
    config_home: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver with an optional explicit path.
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        ConfigResolver {
            explicit_path,
            env_var: CONFIG_ENV_VAR.to_string(),
            config_home: dirs::config_dir(),
        }
    }

    /// Create a resolver with no explicit override.
    pub fn with_defaults() -> Self {
        Self::new(None)
    }

    /// Read the config path from a different environment variable.
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var = name.into();
        self
    }

    /// Override the XDG config home (the parent of `sysexplain/`).
    pub fn with_config_home(mut self, dir: Option<PathBuf>) -> Self {
        self.config_home = dir;
        self
    }

    /// Resolve which file, if any, should be loaded.
    pub fn resolve_path(&self) -> Option<(PathBuf, ConfigResolution)> {
        if let Some(path) = &self.explicit_path {
            return Some((path.clone(), ConfigResolution::Explicit));
        }
        if let Ok(val) = env::var(&self.env_var) {
            if !val.trim().is_empty() {
                return Some((PathBuf::from(val), ConfigResolution::Environment));
            }
        }
        let xdg = self
            .config_home
            .as_ref()?
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);
        if xdg.is_file() {
            Some((xdg, ConfigResolution::Xdg))
        } else {
            None
        }
    }

    /// Load and validate the configuration.
    pub fn load(&self) -> Result<ResolvedConfig, ConfigError> {
        let Some((path, resolution)) = self.resolve_path() else {
            tracing::debug!("no engine config file found, using built-in defaults");
            return Ok(ResolvedConfig {
                config: EngineConfig::default(),
                source: ConfigSource {
                    path: None,
                    hash: None,
                    resolution: ConfigResolution::Defaults,
                },
            });
        };

        let (config, hash) = load_file(&path)?;
        validate_engine_config(&config)?;
        tracing::info!(path = %path.display(), ?resolution, "loaded engine config");

        Ok(ResolvedConfig {
            config,
            source: ConfigSource {
                path: Some(path),
                hash: Some(hash),
                resolution,
            },
        })
    }
}

fn load_file(path: &Path) -> Result<(EngineConfig, String), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = EngineConfig::from_json(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((config, content_hash(content.as_bytes())))
}

/// Hex-encoded SHA-256 of file contents.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash(b"{}");
        assert_eq!(a, content_hash(b"{}"));
        assert_eq!(a.len(), 64);
        assert_ne!(a, content_hash(b"{ }"));
    }

    #[test]
    fn test_config_error_maps_to_common_error() {
        let err: sx_common::Error = ConfigError::NotFound {
            path: PathBuf::from("/nope.json"),
        }
        .into();
        assert_eq!(err.code(), 10);

        let err: sx_common::Error = ConfigError::Validation(ValidationError::TooFewSamples {
            value: 1,
        })
        .into();
        assert_eq!(err.code(), 11);
    }
}
