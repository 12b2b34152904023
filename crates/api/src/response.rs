//! JSON response bodies shared by the routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use vitrine_shared::AppError;

/// Error body: `{ "error": ..., "details"?: ... }`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Client-facing message.
    pub error: String,
    /// Underlying error message for server-side failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Render an application error as an HTTP response.
pub fn error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            details: err.details().map(str::to_string),
        }),
    )
        .into_response()
}
