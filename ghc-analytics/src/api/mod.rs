//! HTTP API handlers for ghc-analytics
//!
//! Handlers are stateless; everything persistent goes through the store.

pub mod audit;
pub mod compliance;
pub mod health;
pub mod ingest;
pub mod placeholders;

pub use audit::{get_audit_job, schedule_audit};
pub use compliance::{get_compliance, get_compliance_history};
pub use health::health_routes;
pub use ingest::{ingest, regenerate};
pub use placeholders::list_placeholders;

use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

use crate::error::{ApiError, ApiResult};

/// `Query` that rejects malformed parameters with the JSON error body
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

/// Await a collaborator call, bounded by the configured deadline if any
pub(crate) async fn with_deadline<T, F>(deadline: Option<Duration>, label: &str, call: F) -> ApiResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::Timeout(format!(
                "{} did not finish within {:?}",
                label, limit
            ))),
        },
        None => call.await.map_err(ApiError::from),
    }
}
