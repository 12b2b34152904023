//! Storage provider types.

use std::fmt;

use serde::{Deserialize, Serialize};
use vitrine_shared::StorageSettings;

use super::error::StorageError;

/// Default public endpoint for Google Cloud Storage objects.
const GCS_PUBLIC_ENDPOINT: &str = "https://storage.googleapis.com";

/// Prefix of Vercel Blob read-write tokens.
const BLOB_TOKEN_PREFIX: &str = "vercel_blob_rw_";

/// Which backend stored an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKind {
    /// Google Cloud Storage.
    #[serde(rename = "gcs")]
    Gcs,
    /// Vercel Blob.
    #[serde(rename = "vercel-blob")]
    VercelBlob,
}

impl StorageKind {
    /// Wire name of the backend.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gcs => "gcs",
            Self::VercelBlob => "vercel-blob",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage provider configuration.
#[derive(Clone, PartialEq, Eq)]
pub enum StorageProvider {
    /// Google Cloud Storage bucket.
    Gcs {
        /// Bucket name.
        bucket: String,
        /// Base64-encoded service account JSON.
        credential: Option<String>,
        /// Path to a service account JSON file.
        credential_path: Option<String>,
        /// Custom endpoint, used for both API calls and public URLs.
        endpoint: Option<String>,
    },
    /// Vercel Blob store.
    VercelBlob {
        /// Read-write token.
        token: String,
        /// Base URL under which stored objects are publicly served.
        public_base_url: String,
    },
}

impl StorageProvider {
    /// Create a GCS provider using ambient credentials.
    #[must_use]
    pub fn gcs(bucket: impl Into<String>) -> Self {
        Self::Gcs {
            bucket: bucket.into(),
            credential: None,
            credential_path: None,
            endpoint: None,
        }
    }

    /// Create a Vercel Blob provider.
    ///
    /// Without an explicit base URL the store id embedded in the token is used.
    pub fn vercel_blob(
        token: impl Into<String>,
        public_base_url: Option<&str>,
    ) -> Result<Self, StorageError> {
        let token = token.into();
        let public_base_url = match public_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => blob_base_url_from_token(&token)?,
        };
        Ok(Self::VercelBlob {
            token,
            public_base_url,
        })
    }

    /// Providers the settings allow, in order of preference.
    ///
    /// GCS comes first when a bucket is set; Vercel Blob follows when a token is set.
    pub fn candidates(settings: &StorageSettings) -> Vec<Result<Self, StorageError>> {
        let mut candidates = Vec::with_capacity(2);

        if let Some(bucket) = settings.bucket() {
            candidates.push(Ok(Self::Gcs {
                bucket: bucket.to_string(),
                credential: settings.gcs_credential.clone(),
                credential_path: settings.gcs_credential_path.clone(),
                endpoint: settings.gcs_endpoint.clone(),
            }));
        }

        if let Some(token) = settings.blob_token() {
            candidates.push(Self::vercel_blob(
                token,
                settings.blob_public_base_url.as_deref(),
            ));
        }

        candidates
    }

    /// Backend kind of this provider.
    #[must_use]
    pub const fn kind(&self) -> StorageKind {
        match self {
            Self::Gcs { .. } => StorageKind::Gcs,
            Self::VercelBlob { .. } => StorageKind::VercelBlob,
        }
    }

    /// Public URL of an object stored under `key`.
    #[must_use]
    pub fn public_url(&self, key: &str) -> String {
        match self {
            Self::Gcs {
                bucket, endpoint, ..
            } => {
                let endpoint = endpoint
                    .as_deref()
                    .map_or(GCS_PUBLIC_ENDPOINT, |e| e.trim_end_matches('/'));
                format!("{endpoint}/{bucket}/{key}")
            }
            Self::VercelBlob {
                public_base_url, ..
            } => format!("{public_base_url}/{key}"),
        }
    }
}

impl fmt::Debug for StorageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gcs {
                bucket,
                credential_path,
                endpoint,
                ..
            } => f
                .debug_struct("Gcs")
                .field("bucket", bucket)
                .field("credential_path", credential_path)
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            Self::VercelBlob {
                public_base_url, ..
            } => f
                .debug_struct("VercelBlob")
                .field("public_base_url", public_base_url)
                .finish_non_exhaustive(),
        }
    }
}

/// Derive the public blob host from a `vercel_blob_rw_<storeId>_<secret>` token.
fn blob_base_url_from_token(token: &str) -> Result<String, StorageError> {
    let store_id = token
        .strip_prefix(BLOB_TOKEN_PREFIX)
        .and_then(|rest| rest.split('_').next())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            StorageError::configuration(
                "blob token is not of the form vercel_blob_rw_<store>_<secret>; set blob_public_base_url",
            )
        })?;

    Ok(format!(
        "https://{}.public.blob.vercel-storage.com",
        store_id.to_ascii_lowercase()
    ))
}
