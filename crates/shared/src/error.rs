//! Application-wide error types.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error caused by the client request.
    #[error("{0}")]
    Validation(String),

    /// Server is missing configuration required to serve the request.
    #[error("{0}")]
    Configuration(String),

    /// External service error.
    #[error("{message}")]
    ExternalService {
        /// Client-facing summary.
        message: String,
        /// Underlying error message.
        details: String,
    },
}

impl AppError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an external service error.
    #[must_use]
    pub fn external_service(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::ExternalService {
            message: message.into(),
            details: details.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Configuration(_) | Self::ExternalService { .. } => 500,
        }
    }

    /// Returns the error code for logs and metrics.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
        }
    }

    /// Returns the underlying error message, if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::ExternalService { details, .. } => Some(details),
            Self::Validation(_) | Self::Configuration(_) => None,
        }
    }
}
