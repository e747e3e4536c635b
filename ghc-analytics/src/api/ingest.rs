//! Ingestion and template regeneration triggers
//!
//! Both run the collaborator to completion inside the request. Collaborator
//! failures come back as 500 with the collaborator's message.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

use super::{with_deadline, ApiQuery};
use crate::collaborators::{GenerateRequest, IngestKind};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// POST /api/v1/ingest?kind=docs|templates|har
pub async fn ingest(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<IngestQuery>,
) -> ApiResult<Json<OkResponse>> {
    let kind: IngestKind = query
        .kind
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("kind is required (docs|templates|har)".to_string()))?
        .parse()
        .map_err(ApiError::BadRequest)?;

    info!("Ingesting {} from {}", kind, state.settings.workspace.display());

    with_deadline(
        state.settings.collaborator_timeout,
        &format!("ingest {}", kind),
        state.collaborators.ingest(kind, &state.settings.workspace),
    )
    .await?;

    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/v1/regenerate/:kind
///
/// Optional JSON object body is passed to the generator as parameters.
/// `docs` renders from `documentation.db`, every other kind from
/// `production.db`. Returns the written paths.
pub async fn regenerate(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    params: Option<Json<Map<String, Value>>>,
) -> ApiResult<Json<Vec<PathBuf>>> {
    if !is_valid_kind(&kind) {
        return Err(ApiError::BadRequest(format!("Invalid kind: {}", kind)));
    }

    let settings = &state.settings;
    let source_db = if kind == "docs" {
        settings.documentation_db()
    } else {
        settings.production_db()
    };

    let request = GenerateRequest {
        out_dir: settings.generated_dir(&kind),
        kind,
        source_db,
        analytics_db: settings.analytics_db.clone(),
        params: params
            .map(|Json(map)| map.into_iter().collect())
            .unwrap_or_default(),
    };

    info!("Regenerating {} from {}", request.kind, request.source_db.display());

    let written = with_deadline(
        settings.collaborator_timeout,
        &format!("regenerate {}", request.kind),
        state.collaborators.generate(&request),
    )
    .await?;

    info!("Regenerated {} file(s) for {}", written.len(), request.kind);
    Ok(Json(written))
}

/// Lowercase letters, digits and underscore only
fn is_valid_kind(kind: &str) -> bool {
    !kind.is_empty()
        && kind.len() < 64
        && kind
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_validation() {
        assert!(is_valid_kind("docs"));
        assert!(is_valid_kind("enterprise_templates2"));
        assert!(!is_valid_kind(""));
        assert!(!is_valid_kind("../etc"));
        assert!(!is_valid_kind("Docs"));
    }
}
