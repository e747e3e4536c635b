//! Operator CLI
//!
//! ```text
//! ghc-analytics migrate [--migrations-dir PATH]
//! ghc-analytics seed-models
//! ghc-analytics compute-score --branch B --lint F --tests F --placeholders F --sessions F
//! ghc-analytics show-score [--branch B]
//! ghc-analytics models
//! ghc-analytics serve [--host H] [--port P]
//! ```
//!
//! Results are printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use crate::collaborators::CommandCollaborators;
use crate::config::{AnalyticsSettings, Overrides};
use crate::db::AnalyticsDao;
use crate::models::ComponentScores;
use crate::scoring::{score_branch, seed_default_models};
use crate::{build_router, AppState};

/// Error recorded on audit jobs that were in flight when the server stopped
pub const INTERRUPTED_AUDIT_ERROR: &str = "interrupted: server stopped before the audit finished";

/// Command-line arguments for ghc-analytics
#[derive(Parser, Debug)]
#[command(name = "ghc-analytics")]
#[command(about = "Compliance scoring store, HTTP API and operator CLI")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true, env = "GH_COPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Analytics SQLite database
    #[arg(long, global = true, env = "GH_COPILOT_ANALYTICS_DB")]
    pub db: Option<PathBuf>,

    /// Workspace root holding databases/documentation.db and databases/production.db
    #[arg(long, global = true, env = "GH_COPILOT_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every *.sql file in the migrations directory, in name order
    Migrate {
        /// Defaults to databases/gh_copilot_migrations
        #[arg(long)]
        migrations_dir: Option<PathBuf>,
    },

    /// Insert the main-default and dev-default models (no-op if present)
    SeedModels,

    /// Score a branch from four component scores in [0, 1] and store the snapshot
    ComputeScore {
        #[arg(long)]
        branch: String,
        #[arg(long, value_parser = parse_unit_interval)]
        lint: f64,
        #[arg(long, value_parser = parse_unit_interval)]
        tests: f64,
        #[arg(long, value_parser = parse_unit_interval)]
        placeholders: f64,
        #[arg(long, value_parser = parse_unit_interval)]
        sessions: f64,
    },

    /// Print the latest snapshot for a branch
    ShowScore {
        #[arg(long, default_value = "main")]
        branch: String,
    },

    /// List seeded compliance models
    Models,

    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            analytics_db: self.db.clone(),
            workspace: self.workspace.clone(),
        }
    }
}

/// clap value parser for component scores
pub fn parse_unit_interval(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not in the range [0, 1]", value))
    }
}

/// Run a parsed command
pub async fn run(command: Command, settings: AnalyticsSettings) -> Result<()> {
    let dao = AnalyticsDao::new(&settings.analytics_db, settings.busy_timeout);

    match command {
        Command::Migrate { migrations_dir } => {
            let dir = migrations_dir.unwrap_or_else(|| settings.migrations_dir.clone());
            let applied = migrate(&dao, &dir).await?;
            print_json(&applied)
        }
        Command::SeedModels => {
            let inserted = seed_default_models(&dao).await?;
            print_json(&serde_json::json!({ "inserted": inserted }))
        }
        Command::ComputeScore {
            branch,
            lint,
            tests,
            placeholders,
            sessions,
        } => {
            let components = ComponentScores {
                lint,
                tests,
                placeholders,
                sessions,
            };
            let report = score_branch(&dao, &branch, components)
                .await
                .with_context(|| format!("Failed to score branch {}", branch))?;
            print_json(&report)
        }
        Command::ShowScore { branch } => {
            let snapshot = dao.fetch_score(&branch).await?;
            match snapshot {
                Some(snapshot) => print_json(&snapshot),
                None => print_json(&serde_json::json!({ "branch": branch, "score": null })),
            }
        }
        Command::Models => print_json(&dao.list_models().await?),
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            serve(dao, settings, &host, port).await
        }
    }
}

/// Apply migrations; the directory must exist
pub async fn migrate(dao: &AnalyticsDao, migrations_dir: &Path) -> Result<Vec<PathBuf>> {
    dao.apply_migrations(migrations_dir)
        .await
        .with_context(|| format!("Migration of {} failed", dao.db_path().display()))
}

/// Serve the HTTP API until Ctrl+C / SIGTERM
pub async fn serve(dao: AnalyticsDao, settings: AnalyticsSettings, host: &str, port: u16) -> Result<()> {
    let orphaned = dao
        .fail_unfinished_audit_jobs(INTERRUPTED_AUDIT_ERROR)
        .await
        .context("Failed to clean up interrupted audit jobs")?;
    if orphaned > 0 {
        warn!("Marked {} interrupted audit job(s) as failed", orphaned);
    }

    let collaborators = Arc::new(CommandCollaborators::new(
        settings.collaborators.clone(),
        settings.workspace.clone(),
        settings.analytics_db.clone(),
    ));

    let state = AppState::new(dao, collaborators, settings);
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("ghc-analytics listening on http://{}", addr);
    info!("Health check: http://{}/api/v1/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_unit_interval_parser() {
        assert_eq!(parse_unit_interval("0").unwrap(), 0.0);
        assert_eq!(parse_unit_interval("1.0").unwrap(), 1.0);
        assert_eq!(parse_unit_interval("0.25").unwrap(), 0.25);
        assert!(parse_unit_interval("1.5").is_err());
        assert!(parse_unit_interval("-0.1").is_err());
        assert!(parse_unit_interval("NaN").is_err());
        assert!(parse_unit_interval("high").is_err());
    }

    #[test]
    fn test_compute_score_arguments() {
        let cli = Cli::try_parse_from([
            "ghc-analytics",
            "--db",
            "test.db",
            "compute-score",
            "--branch",
            "main",
            "--lint",
            "1.0",
            "--tests",
            "0.9",
            "--placeholders",
            "0.5",
            "--sessions",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.db, Some(PathBuf::from("test.db")));
        match cli.command {
            Command::ComputeScore { branch, tests, .. } => {
                assert_eq!(branch, "main");
                assert_eq!(tests, 0.9);
            }
            other => panic!("Unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_compute_score_rejects_out_of_range() {
        let result = Cli::try_parse_from([
            "ghc-analytics",
            "compute-score",
            "--branch",
            "dev",
            "--lint",
            "1.1",
            "--tests",
            "1",
            "--placeholders",
            "1",
            "--sessions",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_subcommand_names() {
        assert!(Cli::try_parse_from(["ghc-analytics", "seed-models"]).is_ok());
        assert!(Cli::try_parse_from(["ghc-analytics", "migrate", "--migrations-dir", "m"]).is_ok());
        assert!(Cli::try_parse_from(["ghc-analytics", "serve", "--port", "9000"]).is_ok());
    }

    #[test]
    #[serial]
    fn test_env_supplies_database() {
        std::env::set_var("GH_COPILOT_ANALYTICS_DB", "/var/lib/ghc/env.db");
        let from_env = Cli::try_parse_from(["ghc-analytics", "models"]);
        let from_flag = Cli::try_parse_from(["ghc-analytics", "--db", "flag.db", "models"]);
        std::env::remove_var("GH_COPILOT_ANALYTICS_DB");

        assert_eq!(from_env.unwrap().db, Some(PathBuf::from("/var/lib/ghc/env.db")));
        assert_eq!(from_flag.unwrap().overrides().analytics_db, Some(PathBuf::from("flag.db")));
    }

    #[test]
    #[serial]
    fn test_workspace_and_config_from_env() {
        std::env::set_var("GH_COPILOT_WORKSPACE", "/srv/repo");
        std::env::set_var("GH_COPILOT_CONFIG", "/etc/ghc/analytics.toml");
        let cli = Cli::try_parse_from(["ghc-analytics", "show-score", "--branch", "dev"]);
        std::env::remove_var("GH_COPILOT_WORKSPACE");
        std::env::remove_var("GH_COPILOT_CONFIG");

        let overrides = cli.unwrap().overrides();
        assert_eq!(overrides.workspace, Some(PathBuf::from("/srv/repo")));
        assert_eq!(overrides.config, Some(PathBuf::from("/etc/ghc/analytics.toml")));
    }
}
