//! Upload service implementation.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::error::UploadError;
use super::types::{UploadDirectory, UploadLimits, UploadRequest, UploadResult, UploadedFile};
use crate::storage::{ObjectStore, RetryPolicy, StorageKind};

/// Name used when nothing of the original filename survives sanitization.
const FALLBACK_FILE_NAME: &str = "upload";

/// A request that passed every check and is ready to be written.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    file: UploadedFile,
    content_type: String,
    directory: UploadDirectory,
}

impl ValidatedUpload {
    /// Target directory.
    #[must_use]
    pub const fn directory(&self) -> UploadDirectory {
        self.directory
    }

    /// Accepted MIME type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

/// Check an upload against `limits` without touching storage.
///
/// # Errors
///
/// Returns, checked in this order:
/// - `MissingFile` when no file was sent
/// - `InvalidType` when the MIME type is not an accepted image type
/// - `TooLarge` when the file exceeds the size limit
/// - `InvalidDirectory` when the directory is not in the allow-list
pub fn validate_upload(
    limits: &UploadLimits,
    request: UploadRequest,
) -> Result<ValidatedUpload, UploadError> {
    let file = request.file.ok_or(UploadError::MissingFile)?;

    let content_type = file.content_type.clone().unwrap_or_default();
    if !limits.is_mime_type_allowed(&content_type) {
        return Err(UploadError::invalid_type(content_type));
    }

    let size = file.size();
    if size > limits.max_file_size {
        return Err(UploadError::too_large(Some(size), limits.max_file_size));
    }

    let directory = match request.directory.as_deref() {
        None | Some("") => UploadDirectory::General,
        Some(raw) => UploadDirectory::parse(raw)
            .ok_or_else(|| UploadError::InvalidDirectory(raw.to_string()))?,
    };

    Ok(ValidatedUpload {
        file,
        content_type,
        directory,
    })
}

/// Upload service: validates, names and stores images.
pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    limits: UploadLimits,
    retry: RetryPolicy,
}

impl UploadService {
    /// Create an upload service with default limits and retry policy.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            limits: UploadLimits::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Set upload limits.
    #[must_use]
    pub fn with_limits(mut self, limits: UploadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the write retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the upload limits.
    #[must_use]
    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Backend receiving the uploads.
    #[must_use]
    pub fn storage_kind(&self) -> StorageKind {
        self.store.kind()
    }

    /// Validate and store an upload.
    ///
    /// # Errors
    ///
    /// Returns the first failed check of [`validate_upload`] before any
    /// write, or `Storage` with the last error when every write attempt fails.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadResult, UploadError> {
        let upload = validate_upload(&self.limits, request)?;
        self.write(upload).await
    }

    /// Store an already validated upload.
    ///
    /// # Errors
    ///
    /// Returns `Storage` with the last error when every write attempt fails.
    pub async fn write(&self, upload: ValidatedUpload) -> Result<UploadResult, UploadError> {
        let key = build_object_key(
            upload.directory,
            &upload.file.file_name,
            Utc::now().timestamp_millis(),
        );

        let store = self.store.as_ref();
        let key_ref = key.as_str();
        let content_type = upload.content_type.as_str();
        let body = upload.file.data;

        let url = self
            .retry
            .run("put_object", || {
                let body = body.clone();
                async move { store.put(key_ref, body, content_type).await }
            })
            .await?;

        info!(
            key = %key,
            storage = %store.kind(),
            directory = upload.directory.as_str(),
            "Upload stored"
        );

        Ok(UploadResult {
            url,
            key,
            storage: store.kind(),
        })
    }
}

/// Sanitize a filename for use in an object key.
///
/// Each whitespace run becomes one hyphen, characters outside
/// `[a-zA-Z0-9.-]` are dropped and the result is lowercased.
/// Applying it twice gives the same result as applying it once.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = String::with_capacity(filename.len());
    let mut in_whitespace = false;

    for c in filename.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                sanitized.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            sanitized.push(c.to_ascii_lowercase());
        }
    }

    sanitized
}

/// Generate the object key for an upload.
///
/// Format: `{directory}/{unix_timestamp_ms}-{sanitized_filename}`
#[must_use]
pub fn build_object_key(directory: UploadDirectory, filename: &str, timestamp_ms: i64) -> String {
    let sanitized = sanitize_filename(filename);
    let name = if sanitized.is_empty() {
        FALLBACK_FILE_NAME
    } else {
        sanitized.as_str()
    };

    format!("{}/{timestamp_ms}-{name}", directory.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageProvider, StorageService};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Store that fails a fixed number of times before accepting writes.
    struct FlakyStore {
        failures: u32,
        attempts: AtomicU32,
        written: Mutex<Vec<(String, String, usize)>>,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                attempts: AtomicU32::new(0),
                written: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ObjectStore for FlakyStore {
        fn kind(&self) -> StorageKind {
            StorageKind::Gcs
        }

        async fn put(
            &self,
            key: &str,
            body: Bytes,
            content_type: &str,
        ) -> Result<String, StorageError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                return Err(StorageError::operation(format!("attempt {attempt} refused")));
            }
            self.written.lock().unwrap().push((
                key.to_string(),
                content_type.to_string(),
                body.len(),
            ));
            Ok(format!("https://storage.googleapis.com/test-bucket/{key}"))
        }
    }

    fn service(store: &Arc<FlakyStore>) -> UploadService {
        UploadService::new(store.clone()).with_retry(RetryPolicy::new(3, Duration::ZERO))
    }

    fn png(name: &str, size: usize) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            data: Bytes::from(vec![0u8; size]),
        }
    }

    fn request(file: Option<UploadedFile>, directory: Option<&str>) -> UploadRequest {
        UploadRequest {
            file,
            directory: directory.map(str::to_string),
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("shoe.png"), "shoe.png");
        assert_eq!(sanitize_filename("My Product  Photo.JPG"), "my-product-photo.jpg");
        assert_eq!(sanitize_filename("summer_sale (1).webp"), "summersale-1.webp");
        assert_eq!(sanitize_filename("café crème.png"), "caf-crme.png");
        assert_eq!(sanitize_filename("日本語.png"), ".png");
        assert_eq!(sanitize_filename("a\tb\nc.avif"), "a-b-c.avif");
    }

    #[test]
    fn test_build_object_key() {
        assert_eq!(
            build_object_key(UploadDirectory::ProductsBanner, "Hero Banner.png", 1_700_000_000_000),
            "products/banner/1700000000000-hero-banner.png"
        );
    }

    #[test]
    fn test_build_object_key_empty_name_falls_back() {
        assert_eq!(
            build_object_key(UploadDirectory::Logos, "日本", 42),
            "logos/42-upload"
        );
    }

    #[tokio::test]
    async fn test_upload_success_defaults_to_general() {
        let store = Arc::new(FlakyStore::new(0));
        let result = service(&store)
            .upload(request(Some(png("Shoe Side.png", 16)), None))
            .await
            .expect("should upload");

        assert!(result.key.starts_with("general/"));
        assert!(result.key.ends_with("-shoe-side.png"));
        assert_eq!(
            result.url,
            format!("https://storage.googleapis.com/test-bucket/{}", result.key)
        );
        assert_eq!(result.storage, StorageKind::Gcs);

        let written = store.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], (result.key.clone(), "image/png".to_string(), 16));
    }

    #[tokio::test]
    async fn test_upload_empty_directory_means_general() {
        let store = Arc::new(FlakyStore::new(0));
        let result = service(&store)
            .upload(request(Some(png("a.png", 1)), Some("")))
            .await
            .expect("should upload");

        assert!(result.key.starts_with("general/"));
    }

    #[tokio::test]
    async fn test_upload_to_nested_directory() {
        let store = Arc::new(FlakyStore::new(0));
        let result = service(&store)
            .upload(request(Some(png("a.png", 1)), Some("products/banner")))
            .await
            .expect("should upload");

        assert!(result.key.starts_with("products/banner/"));
    }

    #[tokio::test]
    async fn test_missing_file_rejected_without_write() {
        let store = Arc::new(FlakyStore::new(0));
        let err = service(&store)
            .upload(request(None, Some("products")))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::MissingFile));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_invalid_type_rejected_without_write() {
        let store = Arc::new(FlakyStore::new(0));
        let mut file = png("doc.pdf", 10);
        file.content_type = Some("application/pdf".to_string());

        let err = service(&store)
            .upload(request(Some(file), None))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidType { .. }));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_invalid() {
        let store = Arc::new(FlakyStore::new(0));
        let mut file = png("a.png", 10);
        file.content_type = None;

        let err = service(&store)
            .upload(request(Some(file), None))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidType { ref mime_type } if mime_type.is_empty()));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_too_large_rejected_without_write() {
        let store = Arc::new(FlakyStore::new(0));
        let service = service(&store).with_limits(UploadLimits::default().with_max_file_size(8));

        let err = service
            .upload(request(Some(png("a.png", 9)), None))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::TooLarge { size: Some(9), max: 8 }));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_exact_limit_is_accepted() {
        let store = Arc::new(FlakyStore::new(0));
        let service = service(&store).with_limits(UploadLimits::default().with_max_file_size(8));

        service
            .upload(request(Some(png("a.png", 8)), None))
            .await
            .expect("should upload");
        assert_eq!(store.attempts(), 1);
    }

    #[tokio::test]
    async fn test_invalid_directory_rejected_without_write() {
        let store = Arc::new(FlakyStore::new(0));
        let err = service(&store)
            .upload(request(Some(png("a.png", 1)), Some("../etc")))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidDirectory(ref d) if d == "../etc"));
        assert_eq!(store.attempts(), 0);
    }

    #[tokio::test]
    async fn test_type_checked_before_size_and_directory() {
        let store = Arc::new(FlakyStore::new(0));
        let service = service(&store).with_limits(UploadLimits::default().with_max_file_size(1));
        let mut file = png("a.gif", 100);
        file.content_type = Some("image/gif".to_string());

        let err = service
            .upload(request(Some(file), Some("nowhere")))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::InvalidType { .. }));
    }

    #[tokio::test]
    async fn test_size_checked_before_directory() {
        let store = Arc::new(FlakyStore::new(0));
        let service = service(&store).with_limits(UploadLimits::default().with_max_file_size(1));

        let err = service
            .upload(request(Some(png("a.png", 100)), Some("nowhere")))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[test]
    fn test_validate_upload_needs_no_store() {
        let limits = UploadLimits::default();

        let upload = validate_upload(&limits, request(Some(png("a.png", 4)), Some("logos")))
            .expect("should validate");
        assert_eq!(upload.directory(), UploadDirectory::Logos);
        assert_eq!(upload.content_type(), "image/png");

        let mut pdf = png("a.pdf", 4);
        pdf.content_type = Some("application/pdf".to_string());
        let err = validate_upload(&limits, request(Some(pdf), None)).unwrap_err();
        assert!(matches!(err, UploadError::InvalidType { .. }));
    }

    #[tokio::test]
    async fn test_backend_fails_twice_then_succeeds() {
        let store = Arc::new(FlakyStore::new(2));
        let result = service(&store)
            .upload(request(Some(png("a.png", 4)), Some("logos")))
            .await;

        assert!(result.is_ok());
        assert_eq!(store.attempts(), 3);
        assert_eq!(store.written.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_backend_fails_every_attempt() {
        let store = Arc::new(FlakyStore::new(u32::MAX));
        let err = service(&store)
            .upload(request(Some(png("a.png", 4)), Some("logos")))
            .await
            .unwrap_err();

        assert_eq!(store.attempts(), 3);
        assert!(matches!(err, UploadError::Storage(_)));
        assert_eq!(err.to_string(), "storage operation failed: attempt 3 refused");
    }

    #[tokio::test]
    async fn test_upload_through_opendal_store() {
        let storage = StorageService::in_memory(
            StorageProvider::vercel_blob("vercel_blob_rw_store1_secret", None).expect("valid"),
        );
        let service = UploadService::new(Arc::new(storage));

        let result = service
            .upload(request(Some(png("Logo.png", 3)), Some("logos")))
            .await
            .expect("should upload");

        assert_eq!(result.storage, StorageKind::VercelBlob);
        assert_eq!(
            result.url,
            format!("https://store1.public.blob.vercel-storage.com/{}", result.key)
        );
    }
}
