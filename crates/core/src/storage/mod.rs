//! Object storage for uploaded images using Apache OpenDAL.
//!
//! Two backends form a closed set, chosen once at startup:
//! - Google Cloud Storage, when a bucket is configured and its client builds
//! - Vercel Blob, as the fallback for environments without cloud credentials
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ UploadService ──► RetryPolicy::run ──► dyn ObjectStore::put     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ StorageService (OpenDAL Operator)                                │
//! │   Gcs        → https://storage.googleapis.com/{bucket}/{key}     │
//! │   VercelBlob → https://{store}.public.blob.vercel-storage.com/.. │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod retry;
mod service;

pub use config::{StorageKind, StorageProvider};
pub use error::StorageError;
pub use retry::RetryPolicy;
pub use service::{ObjectStore, StorageService};
