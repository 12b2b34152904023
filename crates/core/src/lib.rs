//! Core upload logic for Vitrine.
//!
//! This crate contains the upload rules and storage access with ZERO web
//! dependencies. The API crate only translates HTTP to and from these types.
//!
//! # Modules
//!
//! - `upload` - Request validation, filename sanitization, object keys
//! - `storage` - Backend selection (GCS or Vercel Blob) and write retry

pub mod storage;
pub mod upload;
