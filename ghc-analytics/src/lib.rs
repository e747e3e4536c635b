//! ghc-analytics library - compliance scoring store, HTTP API and CLI
//!
//! The store ([`db::AnalyticsDao`]), the resolved settings and the external
//! collaborators are built once at startup and handed to the router through
//! [`AppState`].

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scoring;

use collaborators::Collaborators;
use config::AnalyticsSettings;
use db::AnalyticsDao;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Analytics store
    pub dao: AnalyticsDao,
    /// Ingestion / generation / audit functions
    pub collaborators: Arc<dyn Collaborators>,
    /// Resolved configuration
    pub settings: Arc<AnalyticsSettings>,
}

impl AppState {
    /// Create new application state
    pub fn new(dao: AnalyticsDao, collaborators: Arc<dyn Collaborators>, settings: AnalyticsSettings) -> Self {
        Self {
            dao,
            collaborators,
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
///
/// No authentication layer: bind to localhost or put a proxy in front.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .merge(api::health_routes())
        .route("/api/v1/placeholders", get(api::list_placeholders))
        .route("/api/v1/compliance", get(api::get_compliance))
        .route("/api/v1/compliance/history", get(api::get_compliance_history))
        .route("/api/v1/ingest", post(api::ingest))
        .route("/api/v1/regenerate/:kind", post(api::regenerate))
        .route("/api/v1/audit-consistency", post(api::schedule_audit))
        .route("/api/v1/audit-consistency/:job_id", get(api::get_audit_job))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
