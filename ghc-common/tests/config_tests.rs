//! Unit tests for configuration resolution
//!
//! Tests:
//! - Priority order (flag/env, TOML, default)
//! - Missing default config file falls back to compiled defaults
//! - Explicit config file must exist and parse

use ghc_common::config::{load_toml_config, parse_toml_config, resolve_setting, LoggingConfig};
use ghc_common::Error;
use serde::Deserialize;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug, Default, Deserialize)]
struct SampleConfig {
    #[serde(default)]
    database: Option<PathBuf>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
fn test_resolve_setting_priority() {
    assert_eq!(resolve_setting(Some(1), Some(2), 3), 1);
    assert_eq!(resolve_setting(None, Some(2), 3), 2);
    assert_eq!(resolve_setting(None::<i32>, None, 3), 3);
}

#[test]
fn test_parse_toml_config_with_defaults() {
    let config: SampleConfig = parse_toml_config("database = \"data/a.db\"").unwrap();
    assert_eq!(config.database, Some(PathBuf::from("data/a.db")));
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_parse_toml_config_invalid() {
    let result: Result<SampleConfig, _> = parse_toml_config("database = [");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_explicit_config_file_loaded() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("analytics.toml");
    std::fs::write(&path, "database = \"x.db\"\n[logging]\nlevel = \"debug\"\n").unwrap();

    let (config, source): (SampleConfig, _) = load_toml_config(Some(&path), "analytics.toml").unwrap();
    assert_eq!(config.database, Some(PathBuf::from("x.db")));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(source, Some(path));
}

#[test]
fn test_explicit_config_file_missing_is_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let result: ghc_common::Result<(SampleConfig, _)> = load_toml_config(Some(&path), "absent.toml");
    assert!(matches!(result, Err(Error::Config(_))));
}
