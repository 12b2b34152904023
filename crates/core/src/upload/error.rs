//! Upload error types.

use thiserror::Error;
use vitrine_shared::AppError;

use crate::storage::StorageError;

/// Upload operation errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// No file part in the request.
    #[error("no file provided")]
    MissingFile,

    /// Declared MIME type is not an accepted image type.
    #[error("invalid file type: {mime_type}")]
    InvalidType {
        /// Declared MIME type; empty when none was sent.
        mime_type: String,
    },

    /// File exceeds the size limit.
    #[error("file too large: exceeds maximum {max} bytes")]
    TooLarge {
        /// Actual file size, when the body was read completely.
        size: Option<u64>,
        /// Maximum allowed size.
        max: u64,
    },

    /// Target directory is not in the allow-list.
    #[error("invalid directory: {0}")]
    InvalidDirectory(String),

    /// Request body is not a readable multipart form.
    #[error("invalid form data: {0}")]
    InvalidForm(String),

    /// Storage write failed after all attempts.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    /// Create an invalid type error.
    #[must_use]
    pub fn invalid_type(mime_type: impl Into<String>) -> Self {
        Self::InvalidType {
            mime_type: mime_type.into(),
        }
    }

    /// Create a too large error.
    #[must_use]
    pub fn too_large(size: Option<u64>, max: u64) -> Self {
        Self::TooLarge { size, max }
    }

    /// Create an invalid form error.
    #[must_use]
    pub fn invalid_form(msg: impl Into<String>) -> Self {
        Self::InvalidForm(msg.into())
    }

    /// Stable error kind for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingFile => "MissingFile",
            Self::InvalidType { .. } => "InvalidType",
            Self::TooLarge { .. } => "TooLarge",
            Self::InvalidDirectory(_) => "InvalidDirectory",
            Self::InvalidForm(_) => "InvalidForm",
            Self::Storage(_) => "Storage",
        }
    }

    /// Whether the client caused the error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile => Self::validation("No file provided"),
            UploadError::InvalidType { .. } => Self::validation(
                "Invalid file type. Only JPEG, PNG, WebP and AVIF images are allowed",
            ),
            UploadError::TooLarge { max, .. } => Self::validation(format!(
                "File too large. Maximum size is {}MB",
                max / (1024 * 1024)
            )),
            UploadError::InvalidDirectory(dir) => {
                Self::validation(format!("Invalid directory: {dir}"))
            }
            UploadError::InvalidForm(msg) => Self::validation(format!("Invalid form data: {msg}")),
            UploadError::Storage(e) => Self::external_service("Failed to upload file", e.to_string()),
        }
    }
}
