//! Image upload routes.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::{AppState, response::error_response};
use vitrine_core::storage::StorageKind;
use vitrine_core::upload::{
    UploadDirectory, UploadError, UploadRequest, UploadedFile, validate_upload,
};
use vitrine_shared::AppError;

/// Room for multipart boundaries, headers and the directory field.
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Creates the upload routes.
pub fn routes(max_file_size: u64) -> Router<AppState> {
    let body_limit =
        usize::try_from(max_file_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX);

    Router::new()
        .route(
            "/upload",
            post(upload_image).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/upload/directories", get(list_directories))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a stored upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Public URL of the stored image.
    pub url: String,
    /// Object key of the stored image.
    pub file_name: String,
    /// Backend that stored the image.
    pub storage: StorageKind,
}

/// Response describing what the upload endpoint accepts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOptionsResponse {
    /// Allowed target directories.
    pub directories: Vec<&'static str>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Accepted MIME types.
    pub allowed_types: Vec<String>,
}

/// Request fields logged alongside failures.
///
/// Filled in as the form is read, so a form that fails halfway still
/// reports what arrived before the failure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct UploadContext {
    file_name: Option<String>,
    size: Option<u64>,
    content_type: Option<String>,
    directory: Option<String>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Map a multipart read failure; a tripped body limit counts as an oversized file.
fn multipart_error(err: &MultipartError, max_file_size: u64) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::too_large(None, max_file_size)
    } else {
        UploadError::invalid_form(err.body_text())
    }
}

/// Collect the `file` and `directory` fields of the form.
///
/// A `file` field without a filename is a plain value, not a file.
/// On failure the context holds every field seen so far.
async fn read_upload_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_file_size: u64,
) -> Result<(UploadRequest, UploadContext), (UploadError, UploadContext)> {
    let mut context = UploadContext::default();
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => return Err((UploadError::invalid_form(e.body_text()), context)),
    };
    let mut request = UploadRequest::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err((multipart_error(&e, max_file_size), context)),
        };
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                if file_name.is_some() {
                    context.file_name.clone_from(&file_name);
                    context.content_type.clone_from(&content_type);
                }

                let data = match field.bytes().await {
                    Ok(data) => data,
                    Err(e) => return Err((multipart_error(&e, max_file_size), context)),
                };

                if let Some(file_name) = file_name {
                    context.size = Some(data.len() as u64);
                    request.file = Some(UploadedFile {
                        file_name,
                        content_type,
                        data,
                    });
                }
            }
            "directory" => {
                let directory = match field.text().await {
                    Ok(directory) => directory,
                    Err(e) => return Err((multipart_error(&e, max_file_size), context)),
                };
                context.directory = Some(directory.clone());
                request.directory = Some(directory);
            }
            _ => {}
        }
    }

    Ok((request, context))
}

/// Log a failed upload with its request context, then render it.
fn upload_failed(err: UploadError, context: &UploadContext) -> Response {
    let kind = err.kind();
    let is_validation = err.is_validation();
    let app_err = AppError::from(err);

    if is_validation {
        warn!(
            kind,
            code = app_err.error_code(),
            error = %app_err,
            file_name = ?context.file_name,
            size = ?context.size,
            content_type = ?context.content_type,
            directory = ?context.directory,
            "Upload rejected"
        );
    } else {
        error!(
            kind,
            code = app_err.error_code(),
            error = %app_err,
            details = ?app_err.details(),
            file_name = ?context.file_name,
            size = ?context.size,
            content_type = ?context.content_type,
            directory = ?context.directory,
            "Upload failed"
        );
    }

    error_response(&app_err)
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/upload`
/// Validate an image and store it in the configured backend.
///
/// Validation runs before the backend is consulted, so a bad request is
/// rejected the same way with or without storage configured.
async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let (request, context) = match read_upload_form(multipart, state.limits.max_file_size).await {
        Ok(form) => form,
        Err((e, context)) => return upload_failed(e, &context),
    };

    let upload = match validate_upload(&state.limits, request) {
        Ok(upload) => upload,
        Err(e) => return upload_failed(e, &context),
    };

    let Some(uploads) = &state.uploads else {
        let err = AppError::configuration("Storage is not configured");
        error!(
            code = err.error_code(),
            file_name = ?context.file_name,
            size = ?context.size,
            directory = upload.directory().as_str(),
            "Upload failed: storage is not configured"
        );
        return error_response(&err);
    };

    match uploads.write(upload).await {
        Ok(result) => {
            info!(
                key = %result.key,
                storage = %result.storage,
                size = ?context.size,
                content_type = ?context.content_type,
                "Image uploaded"
            );

            let response = UploadResponse {
                url: result.url,
                file_name: result.key,
                storage: result.storage,
            };

            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => upload_failed(e, &context),
    }
}

/// GET `/upload/directories`
/// List the directories and limits the upload endpoint accepts.
async fn list_directories(State(state): State<AppState>) -> Json<UploadOptionsResponse> {
    Json(UploadOptionsResponse {
        directories: UploadDirectory::ALL
            .iter()
            .map(UploadDirectory::as_str)
            .collect(),
        max_file_size: state.limits.max_file_size,
        allowed_types: state.limits.allowed_mime_types.clone(),
    })
}
