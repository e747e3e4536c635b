//! Score inputs and snapshot persistence
//!
//! Readers get "latest by `ts`" per branch. Concurrent writers for the same
//! branch are not coordinated; ties on `ts` go to the later insert.

use ghc_common::time::{from_db, to_db};
use ghc_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::AnalyticsDao;
use crate::models::{ScoreInputs, ScoreSnapshot};

impl AnalyticsDao {
    /// Insert one run's inputs; a repeated `run_id` is rejected by the primary key
    pub async fn store_score_inputs(&self, inputs: &ScoreInputs) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(
            r#"
            INSERT INTO score_inputs (run_id, lint, tests, placeholders, sessions, model_id, ts)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&inputs.run_id)
        .bind(inputs.lint)
        .bind(inputs.tests)
        .bind(inputs.placeholders)
        .bind(inputs.sessions)
        .bind(&inputs.model_id)
        .bind(to_db(&inputs.ts))
        .execute(&mut conn)
        .await?;
        Self::release(conn).await?;

        Ok(())
    }

    /// Insert a snapshot, embedding its inputs as JSON
    ///
    /// `snap.inputs.run_id` must already be stored (foreign key).
    pub async fn store_score_snapshot(&self, snap: &ScoreSnapshot) -> Result<()> {
        let inputs_json = serde_json::to_string(&snap.inputs)?;

        let mut conn = self.connect().await?;
        sqlx::query(
            r#"
            INSERT INTO score_snapshots (branch, score, model_id, run_id, inputs_json, ts)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snap.branch)
        .bind(snap.score)
        .bind(&snap.model_id)
        .bind(&snap.inputs.run_id)
        .bind(inputs_json)
        .bind(to_db(&snap.ts))
        .execute(&mut conn)
        .await?;
        Self::release(conn).await?;

        Ok(())
    }

    /// Latest snapshot for `branch`, or `None` if it was never scored
    ///
    /// Malformed `inputs_json` is returned as an error, not skipped.
    pub async fn fetch_score(&self, branch: &str) -> Result<Option<ScoreSnapshot>> {
        let mut snapshots = self.fetch_score_history(branch, 1).await?;
        Ok(snapshots.pop())
    }

    /// Up to `limit` snapshots for `branch`, newest first
    pub async fn fetch_score_history(&self, branch: &str, limit: i64) -> Result<Vec<ScoreSnapshot>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            r#"
            SELECT branch, score, model_id, inputs_json, ts
            FROM score_snapshots
            WHERE branch = ?
            ORDER BY ts DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(branch)
        .bind(limit.max(0))
        .fetch_all(&mut conn)
        .await?;
        Self::release(conn).await?;

        rows.iter().map(snapshot_from_row).collect()
    }
}

fn snapshot_from_row(row: &SqliteRow) -> Result<ScoreSnapshot> {
    let inputs_json: String = row.try_get("inputs_json")?;
    let ts: String = row.try_get("ts")?;

    Ok(ScoreSnapshot {
        branch: row.try_get("branch")?,
        score: row.try_get("score")?,
        model_id: row.try_get("model_id")?,
        inputs: serde_json::from_str(&inputs_json)?,
        ts: from_db(&ts)?,
    })
}
