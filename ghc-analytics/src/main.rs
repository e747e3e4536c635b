//! ghc-analytics - compliance scoring store, HTTP API and operator CLI
//!
//! Resolves configuration once (flags / environment / TOML / defaults),
//! initializes tracing, then runs the requested command.

use anyhow::Result;
use clap::Parser;
use ghc_analytics::cli::{self, Cli};
use ghc_analytics::config::AnalyticsSettings;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = AnalyticsSettings::load(&args.overrides())?;

    // RUST_LOG wins over the configured level; stdout is reserved for results
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "ghc-analytics v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    settings.log_summary();

    cli::run(args.command, settings).await
}
