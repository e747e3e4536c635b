//! Compliance score retrieval
//!
//! Missing data is a normal answer: a branch that was never scored returns
//! `{"branch": ..., "score": null}` with 200.

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};

use super::ApiQuery;
use crate::error::{ApiError, ApiResult};
use crate::models::ScoreSnapshot;
use crate::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct ComplianceQuery {
    #[serde(default = "default_branch")]
    pub branch: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_history_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

/// Latest snapshot, or an explicit null score
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ComplianceResponse {
    Scored(ScoreSnapshot),
    Unscored { branch: String, score: Option<f64> },
}

/// GET /api/v1/compliance?branch=main
pub async fn get_compliance(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ComplianceQuery>,
) -> ApiResult<Json<ComplianceResponse>> {
    let response = match state.dao.fetch_score(&query.branch).await? {
        Some(snapshot) => ComplianceResponse::Scored(snapshot),
        None => ComplianceResponse::Unscored {
            branch: query.branch,
            score: None,
        },
    };
    Ok(Json(response))
}

/// GET /api/v1/compliance/history?branch=main&limit=50
///
/// Snapshots newest first.
pub async fn get_compliance_history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<ScoreSnapshot>>> {
    if !(1..=MAX_HISTORY_LIMIT).contains(&query.limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_HISTORY_LIMIT
        )));
    }

    let snapshots = state.dao.fetch_score_history(&query.branch, query.limit).await?;
    Ok(Json(snapshots))
}
