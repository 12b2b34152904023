//! Image uploads for the catalog admin.
//!
//! This module provides:
//! - Upload request validation (file presence, image type, size, directory)
//! - Filename sanitization and object key generation
//! - Delegation to the selected storage backend with write retry

mod error;
mod service;
mod types;

pub use error::UploadError;
pub use service::{
    UploadService, ValidatedUpload, build_object_key, sanitize_filename, validate_upload,
};
pub use types::{UploadDirectory, UploadLimits, UploadRequest, UploadResult, UploadedFile};
