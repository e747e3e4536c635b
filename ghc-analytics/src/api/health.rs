//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
///
/// `ok` is the contract; the rest identifies the build.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub module: String,
    pub version: String,
    pub git_hash: String,
}

/// GET /api/v1/health
///
/// Succeeds whenever the process is up; does not touch the database.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/api/v1/health", get(health_check))
}
