//! Compliance model persistence and resolution

use chrono::{DateTime, Utc};
use ghc_common::time::{from_db, to_db};
use ghc_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use super::AnalyticsDao;
use crate::models::{min_score_for_branch, ScoreModel, ScoreWeights, DEFAULT_MIN_SCORE};

/// Model id used when no model row exists
pub const FALLBACK_MODEL_ID: &str = "default";

/// Conventional model id for a branch (`main` -> `main-default`)
pub fn branch_model_id(branch: &str) -> String {
    format!("{}-default", branch)
}

impl AnalyticsDao {
    /// Insert a model unless one with the same id exists (`INSERT OR IGNORE`)
    ///
    /// Weights are validated first. Returns true when a row was inserted.
    pub async fn seed_model(&self, model_id: &str, weights: &ScoreWeights, effective_from: DateTime<Utc>) -> Result<bool> {
        weights.validate()?;
        let weights_json = serde_json::to_string(weights)?;

        let mut conn = self.connect().await?;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO compliance_models (model_id, weights_json, effective_from)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(model_id)
        .bind(weights_json)
        .bind(to_db(&effective_from))
        .execute(&mut conn)
        .await?;
        Self::release(conn).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Resolve the model used to score `branch`
    ///
    /// 1. The row keyed `"{branch}-default"`, if seeded
    /// 2. Otherwise the most recently effective row
    /// 3. Otherwise the built-in default weights (`model_id = "default"`)
    ///
    /// `min_score` always comes from the branch: 0.90 for `main`, 0.80 otherwise.
    pub async fn fetch_active_model(&self, branch: &str) -> Result<ScoreModel> {
        let min_score = min_score_for_branch(branch);

        let mut conn = self.connect().await?;
        let row = match fetch_model_by_id(&mut conn, &branch_model_id(branch)).await? {
            Some(row) => Some(row),
            None => fetch_latest_model(&mut conn).await?,
        };
        Self::release(conn).await?;

        match row {
            Some(row) => {
                let mut model = model_from_row(&row)?;
                model.min_score = min_score;
                debug!("Resolved model {} for branch {}", model.model_id, branch);
                Ok(model)
            }
            None => {
                debug!("No compliance model seeded, using built-in default for {}", branch);
                Ok(ScoreModel {
                    model_id: FALLBACK_MODEL_ID.to_string(),
                    weights: ScoreWeights::DEFAULT,
                    min_score,
                    effective_from: DateTime::<Utc>::default(),
                })
            }
        }
    }

    /// All seeded models, most recently effective first
    ///
    /// `min_score` follows the branch named by the model id (`main-default`
    /// reports 0.90); ids without the `-default` suffix get the non-main
    /// threshold.
    pub async fn list_models(&self) -> Result<Vec<ScoreModel>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query(
            r#"
            SELECT model_id, weights_json, effective_from
            FROM compliance_models
            ORDER BY effective_from DESC, rowid DESC
            "#,
        )
        .fetch_all(&mut conn)
        .await?;
        Self::release(conn).await?;

        rows.iter().map(model_from_row).collect()
    }
}

async fn fetch_model_by_id(conn: &mut SqliteConnection, model_id: &str) -> Result<Option<SqliteRow>> {
    let row = sqlx::query(
        "SELECT model_id, weights_json, effective_from FROM compliance_models WHERE model_id = ?",
    )
    .bind(model_id)
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

async fn fetch_latest_model(conn: &mut SqliteConnection) -> Result<Option<SqliteRow>> {
    let row = sqlx::query(
        r#"
        SELECT model_id, weights_json, effective_from
        FROM compliance_models
        ORDER BY effective_from DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(conn)
    .await?;
    Ok(row)
}

/// Threshold for the branch a model id is conventionally keyed to
fn min_score_for_model(model_id: &str) -> f64 {
    model_id
        .strip_suffix("-default")
        .map(min_score_for_branch)
        .unwrap_or(DEFAULT_MIN_SCORE)
}

fn model_from_row(row: &SqliteRow) -> Result<ScoreModel> {
    let weights_json: String = row.try_get("weights_json")?;
    let effective_from: String = row.try_get("effective_from")?;
    let model_id: String = row.try_get("model_id")?;

    Ok(ScoreModel {
        weights: serde_json::from_str(&weights_json)?,
        min_score: min_score_for_model(&model_id),
        model_id,
        effective_from: from_db(&effective_from)?,
    })
}
