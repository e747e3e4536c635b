//! Placeholder listing

use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;

use super::ApiQuery;
use crate::db::DEFAULT_PLACEHOLDER_LIMIT;
use crate::error::{ApiError, ApiResult};
use crate::models::{PlaceholderRecord, STATUS_OPEN};
use crate::AppState;

/// Upper bound on `limit`
const MAX_PLACEHOLDER_LIMIT: i64 = 10_000;

/// Query parameters for placeholder listing
#[derive(Debug, Deserialize)]
pub struct PlaceholderQuery {
    #[serde(default = "default_status")]
    pub status: String,

    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_status() -> String {
    STATUS_OPEN.to_string()
}

fn default_limit() -> i64 {
    DEFAULT_PLACEHOLDER_LIMIT
}

/// GET /api/v1/placeholders?status=open&limit=1000
///
/// Newest first; an empty array when nothing matches.
pub async fn list_placeholders(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PlaceholderQuery>,
) -> ApiResult<Json<Vec<PlaceholderRecord>>> {
    if !(1..=MAX_PLACEHOLDER_LIMIT).contains(&query.limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PLACEHOLDER_LIMIT
        )));
    }

    let records = state.dao.fetch_placeholders(&query.status, query.limit).await?;
    Ok(Json(records))
}
