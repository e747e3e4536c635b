//! Analytics store
//!
//! `AnalyticsDao` is the only component that touches `analytics.db`.
//! It holds connect options, not connections: every operation opens its own
//! connection, runs, and closes it. A connection that errors out mid-way is
//! dropped, which closes it as well.
//!
//! No retries: a busy/locked error after `busy_timeout` reaches the caller.

use ghc_common::db::{apply_migrations_dir, connect_options, ensure_parent_dir, open_connection};
use ghc_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

mod audit_jobs;
mod compliance_models;
mod placeholders;
mod scores;

/// Default number of placeholders returned by a listing
pub const DEFAULT_PLACEHOLDER_LIMIT: i64 = 1000;

/// SQLite-backed repository for placeholders, models, scores and audit jobs
#[derive(Debug, Clone)]
pub struct AnalyticsDao {
    db_path: PathBuf,
    options: SqliteConnectOptions,
}

impl AnalyticsDao {
    /// Create a store for `db_path`; nothing is opened until the first call
    pub fn new(db_path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        let db_path = db_path.into();
        let options = connect_options(&db_path, busy_timeout);
        Self { db_path, options }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        ensure_parent_dir(&self.db_path)?;
        open_connection(&self.options).await
    }

    async fn release(conn: SqliteConnection) -> Result<()> {
        conn.close().await?;
        Ok(())
    }

    /// Apply every `*.sql` file in `migrations_dir` (see `ghc_common::db::migrations`)
    pub async fn apply_migrations(&self, migrations_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut conn = self.connect().await?;
        let applied = apply_migrations_dir(&mut conn, migrations_dir).await?;
        Self::release(conn).await?;

        info!(
            "Migrated {} with {} file(s)",
            self.db_path.display(),
            applied.len()
        );
        Ok(applied)
    }
}
