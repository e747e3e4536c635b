//! Placeholder task persistence

use ghc_common::time::{from_db, to_db};
use ghc_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::AnalyticsDao;
use crate::models::{PlaceholderRecord, PlaceholderTask, STATUS_OPEN};

impl AnalyticsDao {
    /// Insert a placeholder with status `open`
    ///
    /// No uniqueness check on (file, line, kind); deduplication belongs to
    /// the scanner. Returns the new row id.
    pub async fn log_placeholder(&self, task: &PlaceholderTask) -> Result<i64> {
        task.validate()?;

        let mut conn = self.connect().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO placeholder_tasks (file, line, kind, sha, status, ts)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.file)
        .bind(i64::from(task.line))
        .bind(task.kind.as_str())
        .bind(&task.sha)
        .bind(STATUS_OPEN)
        .bind(to_db(&task.ts))
        .execute(&mut conn)
        .await?;
        Self::release(conn).await?;

        Ok(result.last_insert_rowid())
    }

    /// Up to `limit` placeholders with `status`, newest first
    pub async fn fetch_placeholders(&self, status: &str, limit: i64) -> Result<Vec<PlaceholderRecord>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, file, line, kind, sha, status, ts
            FROM placeholder_tasks
            WHERE status = ?
            ORDER BY ts DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(status)
        .bind(limit.max(0))
        .fetch_all(&mut conn)
        .await?;
        Self::release(conn).await?;

        rows.iter().map(placeholder_from_row).collect()
    }

    /// Move a placeholder to another status (e.g. `resolved`)
    ///
    /// Returns false when no row has that id.
    pub async fn set_placeholder_status(&self, id: i64, status: &str) -> Result<bool> {
        let mut conn = self.connect().await?;
        let result = sqlx::query("UPDATE placeholder_tasks SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&mut conn)
            .await?;
        Self::release(conn).await?;

        Ok(result.rows_affected() > 0)
    }
}

fn placeholder_from_row(row: &SqliteRow) -> Result<PlaceholderRecord> {
    let line: i64 = row.try_get("line")?;
    let kind: String = row.try_get("kind")?;
    let ts: String = row.try_get("ts")?;

    Ok(PlaceholderRecord {
        id: row.try_get("id")?,
        file: row.try_get("file")?,
        line: u32::try_from(line)
            .map_err(|_| Error::CorruptRow(format!("Stored line out of range: {}", line)))?,
        kind: kind.parse().map_err(|_| Error::CorruptRow(format!("Unknown placeholder kind: {}", kind)))?,
        sha: row.try_get("sha")?,
        status: row.try_get("status")?,
        ts: from_db(&ts)?,
    })
}
