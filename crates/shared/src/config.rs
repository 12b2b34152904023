//! Application configuration management.

use std::fmt;

use serde::Deserialize;

/// Platform variables honoured as defaults when the prefixed keys are absent.
const PLATFORM_DEFAULTS: [(&str, &str); 4] = [
    ("GCS_BUCKET_NAME", "storage.gcs_bucket"),
    ("GOOGLE_CLOUD_CREDENTIALS", "storage.gcs_credential"),
    ("GOOGLE_APPLICATION_CREDENTIALS", "storage.gcs_credential_path"),
    ("BLOB_READ_WRITE_TOKEN", "storage.blob_token"),
];

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage backend configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// Upload limits and retry policy.
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend configuration.
///
/// A bucket selects Google Cloud Storage; otherwise the Vercel Blob token is used.
#[derive(Clone, Default, Deserialize)]
pub struct StorageSettings {
    /// GCS bucket name.
    #[serde(default)]
    pub gcs_bucket: Option<String>,
    /// Base64-encoded service account JSON.
    #[serde(default)]
    pub gcs_credential: Option<String>,
    /// Path to a service account JSON file.
    #[serde(default)]
    pub gcs_credential_path: Option<String>,
    /// Custom GCS endpoint (emulators).
    #[serde(default)]
    pub gcs_endpoint: Option<String>,
    /// Vercel Blob read-write token.
    #[serde(default)]
    pub blob_token: Option<String>,
    /// Public base URL for blob objects; derived from the token when unset.
    #[serde(default)]
    pub blob_public_base_url: Option<String>,
}

impl StorageSettings {
    /// Returns the bucket name if one is set and not blank.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        non_blank(self.gcs_bucket.as_deref())
    }

    /// Returns the blob token if one is set and not blank.
    #[must_use]
    pub fn blob_token(&self) -> Option<&str> {
        non_blank(self.blob_token.as_deref())
    }
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("gcs_bucket", &self.gcs_bucket)
            .field("gcs_credential", &self.gcs_credential.as_ref().map(|_| "<redacted>"))
            .field("gcs_credential_path", &self.gcs_credential_path)
            .field("gcs_endpoint", &self.gcs_endpoint)
            .field("blob_token", &self.blob_token.as_ref().map(|_| "<redacted>"))
            .field("blob_public_base_url", &self.blob_public_base_url)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Upload limits and retry policy.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Maximum accepted file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Total write attempts, including the first one.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Fixed pause between write attempts in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_max_file_size() -> u64 {
    15 * 1024 * 1024 // 15 MiB
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Precedence, lowest first: platform variables (`GCS_BUCKET_NAME`,
    /// `BLOB_READ_WRITE_TOKEN`, ...), `config/default`, `config/{RUN_MODE}`,
    /// then `VITRINE__*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder();
        for (var, key) in PLATFORM_DEFAULTS {
            if let Ok(value) = std::env::var(var) {
                builder = builder.set_default(key, value)?;
            }
        }

        let config = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("VITRINE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
