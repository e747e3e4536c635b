//! Background consistency audit
//!
//! Scheduling returns immediately. The audit runs on a spawned task and its
//! outcome is recorded on a job row (`scheduled -> running ->
//! succeeded | failed`) that clients poll by id. The collaborator deadline
//! does not apply here; a hung audit stays `running`.
//!
//! The task is not awaited on shutdown. Jobs left unfinished by a stopped
//! server are failed when `serve` next starts.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::collaborators::AuditRequest;
use crate::error::{ApiError, ApiResult};
use crate::models::{AuditJob, AuditJobState};
use crate::AppState;

/// Optional request body
#[derive(Debug, Default, Deserialize)]
pub struct AuditParams {
    /// Roots to scan; defaults to the workspace
    #[serde(default)]
    pub base_paths: Option<Vec<PathBuf>>,
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
    #[serde(default)]
    pub regenerate: bool,
    #[serde(default)]
    pub reingest: bool,
}

/// Markers the audit looks for when no patterns are given
pub const DEFAULT_AUDIT_PATTERNS: [&str; 3] = ["TODO", "FIXME", "TBD"];

#[derive(Debug, Serialize)]
pub struct ScheduledResponse {
    pub status: &'static str,
    pub job_id: String,
}

/// POST /api/v1/audit-consistency
pub async fn schedule_audit(
    State(state): State<AppState>,
    params: Option<Json<AuditParams>>,
) -> ApiResult<Json<ScheduledResponse>> {
    let params = params.map(|Json(p)| p).unwrap_or_default();
    let settings = &state.settings;

    let request = AuditRequest {
        enterprise_db: settings.enterprise_db(),
        production_db: settings.production_db(),
        analytics_db: settings.analytics_db.clone(),
        base_paths: params
            .base_paths
            .unwrap_or_else(|| vec![settings.workspace.clone()]),
        patterns: params.patterns.unwrap_or_else(|| {
            DEFAULT_AUDIT_PATTERNS.iter().map(|p| p.to_string()).collect()
        }),
        regenerate: params.regenerate,
        reingest: params.reingest,
    };

    let job = state.dao.create_audit_job().await?;
    info!("Scheduled consistency audit {}", job.job_id);

    tokio::spawn(run_audit_job(state.clone(), job.job_id.clone(), request));

    Ok(Json(ScheduledResponse {
        status: AuditJobState::Scheduled.as_str(),
        job_id: job.job_id,
    }))
}

/// GET /api/v1/audit-consistency/:job_id
pub async fn get_audit_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<AuditJob>> {
    state
        .dao
        .fetch_audit_job(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Audit job {}", job_id)))
}

async fn run_audit_job(state: AppState, job_id: String, request: AuditRequest) {
    if let Err(e) = state
        .dao
        .set_audit_job_state(&job_id, AuditJobState::Running, None)
        .await
    {
        warn!("Audit {}: could not mark running: {}", job_id, e);
    }

    let (final_state, message) = match state.collaborators.run_audit(&request).await {
        Ok(()) => {
            info!("Audit {} succeeded", job_id);
            (AuditJobState::Succeeded, None)
        }
        Err(e) => {
            let message = format!("{:#}", e);
            error!("Audit {} failed: {}", job_id, message);
            (AuditJobState::Failed, Some(message))
        }
    };

    if let Err(e) = state
        .dao
        .set_audit_job_state(&job_id, final_state, message.as_deref())
        .await
    {
        error!("Audit {}: could not record outcome {}: {}", job_id, final_state.as_str(), e);
    }
}
