//! Health check endpoints.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use vitrine_core::storage::StorageKind;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Active storage backend, absent when none is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageKind>,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = state.uploads.as_ref().map(|u| u.storage_kind());
    Json(HealthResponse {
        status: if storage.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage,
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
