//! Upload types and data structures.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use vitrine_shared::UploadSettings;

use crate::storage::StorageKind;

/// Directories an upload may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UploadDirectory {
    /// Course images.
    #[serde(rename = "courses")]
    Courses,
    /// Batch images.
    #[serde(rename = "batches")]
    Batches,
    /// Anything without a dedicated directory.
    #[default]
    #[serde(rename = "general")]
    General,
    /// Product photos.
    #[serde(rename = "products")]
    Products,
    /// Product banners.
    #[serde(rename = "products/banner")]
    ProductsBanner,
    /// Category icons.
    #[serde(rename = "category-icons")]
    CategoryIcons,
    /// Brand logos.
    #[serde(rename = "logos")]
    Logos,
}

impl UploadDirectory {
    /// Every allowed directory.
    pub const ALL: [Self; 7] = [
        Self::Courses,
        Self::Batches,
        Self::General,
        Self::Products,
        Self::ProductsBanner,
        Self::CategoryIcons,
        Self::Logos,
    ];

    /// Key prefix for this directory.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Courses => "courses",
            Self::Batches => "batches",
            Self::General => "general",
            Self::Products => "products",
            Self::ProductsBanner => "products/banner",
            Self::CategoryIcons => "category-icons",
            Self::Logos => "logos",
        }
    }

    /// Parse a form value. Matching is exact.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }
}

/// A file part received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadedFile {
    /// Size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// An upload as received, before validation.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// File part, if one was sent.
    pub file: Option<UploadedFile>,
    /// Raw directory value; absent or empty means `general`.
    pub directory: Option<String>,
}

/// A stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Public URL of the object.
    pub url: String,
    /// Object key in the store.
    pub key: String,
    /// Backend that stored the object.
    pub storage: StorageKind,
}

/// Limits applied before anything is written.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: Self::default_mime_types(),
        }
    }
}

impl UploadLimits {
    /// Default max file size: 15 MiB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 15 * 1024 * 1024;

    /// Build limits from upload settings.
    #[must_use]
    pub fn from_settings(settings: &UploadSettings) -> Self {
        Self::default().with_max_file_size(settings.max_file_size)
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Default accepted image types.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        vec![
            "image/jpeg".to_string(),
            // Non-standard, but sent by some clients.
            "image/jpg".to_string(),
            "image/png".to_string(),
            "image/webp".to_string(),
            "image/avif".to_string(),
        ]
    }

    /// Check if a MIME type is allowed.
    ///
    /// Parameters after `;` are ignored and comparison is case-insensitive.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
    }
}
