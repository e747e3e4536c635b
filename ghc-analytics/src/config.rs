//! Configuration for ghc-analytics
//!
//! Bootstrap settings are resolved once at startup, in priority order:
//! 1. Command-line flag / environment variable (`GH_COPILOT_ANALYTICS_DB`,
//!    `GH_COPILOT_WORKSPACE`, `GH_COPILOT_CONFIG`)
//! 2. TOML config file (`--config`, else `~/.config/gh_copilot/analytics.toml`)
//! 3. Built-in defaults
//!
//! The resolved [`AnalyticsSettings`] is passed explicitly to the store, the
//! CLI commands and the HTTP state; nothing reads the environment later.

use ghc_common::config::{load_toml_config, resolve_setting, LoggingConfig};
use ghc_common::db::DEFAULT_BUSY_TIMEOUT;
use ghc_common::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::collaborators::CollaboratorCommands;

/// Default config file name under the platform config dir
pub const CONFIG_FILE_NAME: &str = "analytics.toml";

pub const DEFAULT_ANALYTICS_DB: &str = "analytics.db";
pub const DEFAULT_WORKSPACE: &str = ".";
pub const DEFAULT_MIGRATIONS_DIR: &str = "databases/gh_copilot_migrations";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Contents of the TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub analytics_db: Option<PathBuf>,
    #[serde(default)]
    pub workspace: Option<PathBuf>,
    #[serde(default)]
    pub migrations_dir: Option<PathBuf>,
    #[serde(default)]
    pub busy_timeout_secs: Option<u64>,
    /// Deadline for synchronous ingest/regenerate calls; unset = unbounded
    #[serde(default)]
    pub collaborator_timeout_secs: Option<u64>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub collaborators: CollaboratorCommands,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// Values that arrive from flags or environment variables
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub analytics_db: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
}

/// Resolved runtime settings
#[derive(Debug, Clone)]
pub struct AnalyticsSettings {
    pub analytics_db: PathBuf,
    pub workspace: PathBuf,
    pub migrations_dir: PathBuf,
    pub busy_timeout: Duration,
    pub collaborator_timeout: Option<Duration>,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub collaborators: CollaboratorCommands,
    /// Config file the settings came from, if any
    pub config_file: Option<PathBuf>,
}

impl AnalyticsSettings {
    /// Load the TOML file (if any) and merge it with overrides
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let (toml, config_file) = load_toml_config::<TomlConfig>(overrides.config.as_deref(), CONFIG_FILE_NAME)?;
        Ok(Self::resolve(overrides, toml, config_file))
    }

    /// Merge already-parsed TOML with overrides
    pub fn resolve(overrides: &Overrides, toml: TomlConfig, config_file: Option<PathBuf>) -> Self {
        Self {
            analytics_db: resolve_setting(
                overrides.analytics_db.clone(),
                toml.analytics_db,
                PathBuf::from(DEFAULT_ANALYTICS_DB),
            ),
            workspace: resolve_setting(
                overrides.workspace.clone(),
                toml.workspace,
                PathBuf::from(DEFAULT_WORKSPACE),
            ),
            migrations_dir: resolve_setting(None, toml.migrations_dir, PathBuf::from(DEFAULT_MIGRATIONS_DIR)),
            busy_timeout: toml
                .busy_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_BUSY_TIMEOUT),
            collaborator_timeout: toml.collaborator_timeout_secs.map(Duration::from_secs),
            host: resolve_setting(None, toml.server.host, DEFAULT_HOST.to_string()),
            port: resolve_setting(None, toml.server.port, DEFAULT_PORT),
            log_level: toml.logging.level,
            collaborators: toml.collaborators,
            config_file,
        }
    }

    /// Settings for tests and embedding: given database and workspace, defaults elsewhere
    pub fn for_paths(analytics_db: impl Into<PathBuf>, workspace: impl Into<PathBuf>) -> Self {
        let overrides = Overrides {
            config: None,
            analytics_db: Some(analytics_db.into()),
            workspace: Some(workspace.into()),
        };
        Self::resolve(&overrides, TomlConfig::default(), None)
    }

    /// `<workspace>/databases/<name>`
    pub fn workspace_db(&self, name: &str) -> PathBuf {
        self.workspace.join("databases").join(name)
    }

    pub fn documentation_db(&self) -> PathBuf {
        self.workspace_db("documentation.db")
    }

    pub fn production_db(&self) -> PathBuf {
        self.workspace_db("production.db")
    }

    pub fn enterprise_db(&self) -> PathBuf {
        self.workspace_db("enterprise_assets.db")
    }

    /// Output directory for regenerated files of `kind`
    pub fn generated_dir(&self, kind: &str) -> PathBuf {
        self.workspace.join("generated").join(kind)
    }

    pub fn log_summary(&self) {
        match &self.config_file {
            Some(path) => info!("Config file: {}", path.display()),
            None => info!("Config file: none (built-in defaults)"),
        }
        info!("Analytics database: {}", self.analytics_db.display());
        info!("Workspace: {}", self.workspace.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghc_common::config::parse_toml_config;

    #[test]
    fn test_defaults_without_config() {
        let settings = AnalyticsSettings::resolve(&Overrides::default(), TomlConfig::default(), None);
        assert_eq!(settings.analytics_db, PathBuf::from("analytics.db"));
        assert_eq!(settings.workspace, PathBuf::from("."));
        assert_eq!(settings.migrations_dir, PathBuf::from("databases/gh_copilot_migrations"));
        assert_eq!(settings.busy_timeout, Duration::from_secs(30));
        assert_eq!(settings.collaborator_timeout, None);
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_toml_values_applied() {
        let toml: TomlConfig = parse_toml_config(
            r#"
            analytics_db = "/var/lib/ghc/analytics.db"
            workspace = "/srv/repo"
            busy_timeout_secs = 5
            collaborator_timeout_secs = 120

            [server]
            port = 9100

            [logging]
            level = "debug"

            [collaborators]
            ingest_har = ["python", "scripts/ingest_har.py"]
            "#,
        )
        .unwrap();

        let settings = AnalyticsSettings::resolve(&Overrides::default(), toml, None);
        assert_eq!(settings.analytics_db, PathBuf::from("/var/lib/ghc/analytics.db"));
        assert_eq!(settings.production_db(), PathBuf::from("/srv/repo/databases/production.db"));
        assert_eq!(settings.busy_timeout, Duration::from_secs(5));
        assert_eq!(settings.collaborator_timeout, Some(Duration::from_secs(120)));
        assert_eq!(settings.host, "127.0.0.1");
        assert_eq!(settings.port, 9100);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(
            settings.collaborators.ingest_har,
            Some(vec!["python".to_string(), "scripts/ingest_har.py".to_string()])
        );
    }

    #[test]
    fn test_overrides_beat_toml() {
        let toml: TomlConfig = parse_toml_config("analytics_db = \"from-toml.db\"").unwrap();
        let overrides = Overrides {
            analytics_db: Some(PathBuf::from("from-flag.db")),
            ..Default::default()
        };

        let settings = AnalyticsSettings::resolve(&overrides, toml, None);
        assert_eq!(settings.analytics_db, PathBuf::from("from-flag.db"));
    }

    #[test]
    fn test_workspace_paths() {
        let settings = AnalyticsSettings::for_paths("a.db", "/repo");
        assert_eq!(settings.documentation_db(), PathBuf::from("/repo/databases/documentation.db"));
        assert_eq!(settings.enterprise_db(), PathBuf::from("/repo/databases/enterprise_assets.db"));
        assert_eq!(settings.generated_dir("docs"), PathBuf::from("/repo/generated/docs"));
    }
}
