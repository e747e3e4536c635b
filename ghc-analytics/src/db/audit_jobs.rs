//! Audit job persistence
//!
//! A job row is created when an audit is scheduled and moves
//! `scheduled -> running -> succeeded | failed`.

use ghc_common::time::{from_db, now, to_db};
use ghc_common::uuid_utils;
use ghc_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::AnalyticsDao;
use crate::models::{AuditJob, AuditJobState};

impl AnalyticsDao {
    /// Create a job in state `scheduled`
    pub async fn create_audit_job(&self) -> Result<AuditJob> {
        let ts = now();
        let job = AuditJob {
            job_id: uuid_utils::generate_string(),
            state: AuditJobState::Scheduled,
            error: None,
            created_at: ts,
            updated_at: ts,
        };

        let mut conn = self.connect().await?;
        sqlx::query(
            r#"
            INSERT INTO audit_jobs (job_id, state, error, created_at, updated_at)
            VALUES (?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&job.job_id)
        .bind(job.state.as_str())
        .bind(to_db(&job.created_at))
        .bind(to_db(&job.updated_at))
        .execute(&mut conn)
        .await?;
        Self::release(conn).await?;

        Ok(job)
    }

    /// Record a state transition; `error` is kept only for `failed`
    pub async fn set_audit_job_state(&self, job_id: &str, state: AuditJobState, error: Option<&str>) -> Result<()> {
        let error = if state == AuditJobState::Failed { error } else { None };

        let mut conn = self.connect().await?;
        sqlx::query("UPDATE audit_jobs SET state = ?, error = ?, updated_at = ? WHERE job_id = ?")
            .bind(state.as_str())
            .bind(error)
            .bind(to_db(&now()))
            .bind(job_id)
            .execute(&mut conn)
            .await?;
        Self::release(conn).await?;

        Ok(())
    }

    /// Fail every job still `scheduled` or `running`
    ///
    /// Audit tasks live in the serving process, so such rows at startup
    /// belong to a process that is gone. Returns the number of jobs failed.
    pub async fn fail_unfinished_audit_jobs(&self, reason: &str) -> Result<u64> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            r#"
            UPDATE audit_jobs SET state = ?, error = ?, updated_at = ?
            WHERE state IN (?, ?)
            "#,
        )
        .bind(AuditJobState::Failed.as_str())
        .bind(reason)
        .bind(to_db(&now()))
        .bind(AuditJobState::Scheduled.as_str())
        .bind(AuditJobState::Running.as_str())
        .execute(&mut conn)
        .await?;
        Self::release(conn).await?;

        Ok(result.rows_affected())
    }

    pub async fn fetch_audit_job(&self, job_id: &str) -> Result<Option<AuditJob>> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(
            "SELECT job_id, state, error, created_at, updated_at FROM audit_jobs WHERE job_id = ?",
        )
        .bind(job_id)
        .fetch_optional(&mut conn)
        .await?;
        Self::release(conn).await?;

        row.as_ref().map(audit_job_from_row).transpose()
    }
}

fn audit_job_from_row(row: &SqliteRow) -> Result<AuditJob> {
    let state: String = row.try_get("state")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(AuditJob {
        job_id: row.try_get("job_id")?,
        state: state
            .parse()
            .map_err(|_| Error::CorruptRow(format!("Unknown audit job state: {}", state)))?,
        error: row.try_get("error")?,
        created_at: from_db(&created_at)?,
        updated_at: from_db(&updated_at)?,
    })
}
