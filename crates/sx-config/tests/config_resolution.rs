//! Config resolution against real files on disk.

use std::fs;
use std::path::PathBuf;

use sx_common::Audience;
use sx_config::{ConfigError, ConfigResolution, ConfigResolver};
use tempfile::TempDir;

/// Resolver isolated from the host: unused env var, empty config home.
fn isolated(home: &TempDir, explicit: Option<PathBuf>) -> ConfigResolver {
    ConfigResolver::new(explicit)
        .with_env_var("SYSEXPLAIN_CONFIG_TEST_UNSET_VAR")
        .with_config_home(Some(home.path().to_path_buf()))
}

#[test]
fn defaults_when_nothing_present() {
    let home = TempDir::new().unwrap();
    let resolved = isolated(&home, None).load().unwrap();

    assert_eq!(resolved.source.resolution, ConfigResolution::Defaults);
    assert!(resolved.source.path.is_none());
    assert!(resolved.source.hash.is_none());
    assert_eq!(resolved.config.history.metrics_capacity, 60);
}

#[test]
fn xdg_file_is_picked_up() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("sysexplain");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("engine.json"),
        r#"{"audiences": ["power"], "history": {"insight_capacity": 50}}"#,
    )
    .unwrap();

    let resolved = isolated(&home, None).load().unwrap();
    assert_eq!(resolved.source.resolution, ConfigResolution::Xdg);
    assert_eq!(resolved.config.audiences, vec![Audience::Power]);
    assert_eq!(resolved.config.history.insight_capacity, 50);
    assert_eq!(resolved.source.hash.as_ref().map(String::len), Some(64));
}

#[test]
fn explicit_path_wins_over_xdg() {
    let home = TempDir::new().unwrap();
    let dir = home.path().join("sysexplain");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("engine.json"), r#"{"audiences": ["power"]}"#).unwrap();

    let explicit = home.path().join("custom.json");
    fs::write(&explicit, r#"{"audiences": ["developer"]}"#).unwrap();

    let resolved = isolated(&home, Some(explicit.clone())).load().unwrap();
    assert_eq!(resolved.source.resolution, ConfigResolution::Explicit);
    assert_eq!(resolved.source.path, Some(explicit));
    assert_eq!(resolved.config.audiences, vec![Audience::Developer]);
}

#[test]
fn missing_explicit_path_is_an_error() {
    let home = TempDir::new().unwrap();
    let err = isolated(&home, Some(home.path().join("absent.json")))
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let home = TempDir::new().unwrap();
    let explicit = home.path().join("broken.json");
    fs::write(&explicit, "{ not json").unwrap();

    let err = isolated(&home, Some(explicit)).load().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn semantically_invalid_config_is_rejected() {
    let home = TempDir::new().unwrap();
    let explicit = home.path().join("invalid.json");
    fs::write(&explicit, r#"{"history": {"recent_window": 500}}"#).unwrap();

    let err = isolated(&home, Some(explicit)).load().unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}
