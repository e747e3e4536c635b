//! Database connection setup
//!
//! Every connection is opened with the same pragmas:
//! - `journal_mode = WAL` so readers proceed while one writer commits
//! - `synchronous = NORMAL`
//! - `foreign_keys = ON`
//! - `busy_timeout` equal to the connection timeout (default 30s)
//!
//! There is no pool. Callers open a connection per operation and close it
//! when the operation ends; WAL plus the busy timeout is the only
//! concurrency control between processes.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteSynchronous};
use sqlx::ConnectOptions;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Default connection / busy timeout
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// Build connect options for a database file
///
/// The file (and its parent directory, see [`ensure_parent_dir`]) is created
/// on first connect.
pub fn connect_options(db_path: &Path, busy_timeout: Duration) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(busy_timeout)
}

/// Create the parent directory of a database file if it doesn't exist
pub fn ensure_parent_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Open a single connection
pub async fn open_connection(options: &SqliteConnectOptions) -> Result<SqliteConnection> {
    let conn = options.connect().await?;
    debug!("Opened connection to {}", options.get_filename().display());
    Ok(conn)
}
