//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for image uploads
//! - JSON error responses
//! - Router assembly with tracing and CORS layers

pub mod response;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vitrine_core::upload::{UploadLimits, UploadService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload service; `None` when no storage backend could be configured.
    pub uploads: Option<Arc<UploadService>>,
    /// Limits applied to incoming uploads.
    pub limits: Arc<UploadLimits>,
}

impl AppState {
    /// Creates state around a configured upload service.
    #[must_use]
    pub fn new(uploads: UploadService) -> Self {
        let limits = Arc::new(uploads.limits().clone());
        Self {
            uploads: Some(Arc::new(uploads)),
            limits,
        }
    }

    /// Creates state for a process without a storage backend.
    #[must_use]
    pub fn without_storage(limits: UploadLimits) -> Self {
        Self {
            uploads: None,
            limits: Arc::new(limits),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes_with_state(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
