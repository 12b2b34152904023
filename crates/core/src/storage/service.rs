//! Storage service implementation using Apache OpenDAL.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::{Operator, services};
use tracing::{info, warn};
use vitrine_shared::StorageSettings;

use super::config::{StorageKind, StorageProvider};
use super::error::StorageError;

/// Write side of an object store.
///
/// One call is one attempt; retrying is the caller's concern.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend that receives the writes.
    fn kind(&self) -> StorageKind;

    /// Store `body` under `key` and return the object's public URL.
    async fn put(&self, key: &str, body: Bytes, content_type: &str)
    -> Result<String, StorageError>;
}

/// OpenDAL-backed object store.
pub struct StorageService {
    operator: Operator,
    provider: StorageProvider,
}

impl StorageService {
    /// Create a storage service for a single provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_provider(provider: StorageProvider) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&provider)?;
        Ok(Self { operator, provider })
    }

    /// Pick the backend for this process.
    ///
    /// GCS is used when a bucket is configured and its client builds;
    /// otherwise the Vercel Blob fallback is used.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no provider is usable.
    pub fn select(settings: &StorageSettings) -> Result<Self, StorageError> {
        Self::select_from(StorageProvider::candidates(settings))
    }

    /// Take the first candidate whose operator builds, in order.
    fn select_from(
        candidates: impl IntoIterator<Item = Result<StorageProvider, StorageError>>,
    ) -> Result<Self, StorageError> {
        let mut last_err = None;

        for candidate in candidates {
            let service = candidate.and_then(Self::from_provider);
            match service {
                Ok(service) => {
                    info!(
                        storage = %service.kind(),
                        provider = ?service.provider,
                        "Storage backend selected"
                    );
                    return Ok(service);
                }
                Err(e) => {
                    warn!(error = %e, "Storage backend unavailable, trying next");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            StorageError::configuration(
                "no storage backend configured: set a GCS bucket or a blob read-write token",
            )
        }))
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Gcs {
                bucket,
                credential,
                credential_path,
                endpoint,
            } => {
                let mut builder = services::Gcs::default().bucket(bucket);
                if let Some(credential) = credential {
                    builder = builder.credential(credential);
                }
                if let Some(path) = credential_path {
                    builder = builder.credential_path(path);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::VercelBlob { token, .. } => {
                let builder = services::VercelBlob::default().token(token);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Storage service over OpenDAL's in-memory backend.
    #[cfg(test)]
    pub(crate) fn in_memory(provider: StorageProvider) -> Self {
        let operator = Operator::new(services::Memory::default())
            .expect("memory operator builds")
            .finish();
        Self { operator, provider }
    }

    #[cfg(test)]
    pub(crate) fn operator(&self) -> &Operator {
        &self.operator
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    fn kind(&self) -> StorageKind {
        self.provider.kind()
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let mut write = self.operator.write_with(key, body);
        if self
            .operator
            .info()
            .full_capability()
            .write_with_content_type
        {
            write = write.content_type(content_type);
        }
        write.await?;

        Ok(self.provider.public_url(key))
    }
}
