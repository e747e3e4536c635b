//! Directory-based SQL migrations
//!
//! Applies every `*.sql` file in a directory, in lexicographic file-name
//! order, each as one multi-statement script. Each file commits on its own.
//!
//! There is no version tracking: re-running applies every file again, so
//! migration files must be idempotent (`CREATE TABLE IF NOT EXISTS`,
//! `CREATE INDEX IF NOT EXISTS`, `INSERT OR IGNORE`). The first failing file
//! stops the run; files applied before it stay applied.

use crate::{Error, Result};
use sqlx::SqliteConnection;
use std::path::{Path, PathBuf};
use tracing::info;

/// List migration files in application order
pub fn list_migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotFound(format!(
            "Migrations directory {}",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Apply all migration files in `dir`
///
/// Returns the files applied, in order.
pub async fn apply_migrations_dir(conn: &mut SqliteConnection, dir: &Path) -> Result<Vec<PathBuf>> {
    let files = list_migration_files(dir)?;

    if files.is_empty() {
        info!("No migration files in {}", dir.display());
        return Ok(files);
    }

    info!("Applying {} migration file(s) from {}", files.len(), dir.display());

    for file in &files {
        let script = std::fs::read_to_string(file)?;

        sqlx::raw_sql(&script)
            .execute(&mut *conn)
            .await
            .map_err(|source| Error::Migration {
                file: file.clone(),
                source,
            })?;

        info!("✓ Applied {}", file.display());
    }

    Ok(files)
}
