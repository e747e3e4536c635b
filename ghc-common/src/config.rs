//! Configuration loading and setting resolution
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive merged from clap (`#[arg(long, env = "...")]`), so
//! callers pass a single `Option` for them.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "gh_copilot";

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Pick the first available value: flag/env, then TOML, then default
pub fn resolve_setting<T>(cli_or_env: Option<T>, toml_value: Option<T>, default: T) -> T {
    cli_or_env.or(toml_value).unwrap_or(default)
}

/// Default location of a config file for the current platform
///
/// `~/.config/gh_copilot/<file_name>` on Linux, the equivalent platform
/// config dir elsewhere. Returns `None` when the platform has no config dir.
pub fn default_config_path(file_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(file_name))
}

/// Load a TOML config file
///
/// An explicit path must exist and parse. Without one, the platform default
/// is used if present; a missing default file yields `T::default()` so a bare
/// checkout runs with compiled defaults.
pub fn load_toml_config<T>(explicit: Option<&Path>, file_name: &str) -> Result<(T, Option<PathBuf>)>
where
    T: DeserializeOwned + Default,
{
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path(file_name) {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using compiled defaults");
                return Ok((T::default(), None));
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config = parse_toml_config(&content)
        .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))?;

    Ok((config, Some(path)))
}

/// Parse TOML config content
pub fn parse_toml_config<T: DeserializeOwned>(content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
}
