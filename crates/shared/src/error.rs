//! Cross-cutting application errors used at the HTTP boundary.
//!
//! Domain failures carry their own error enums in `sairex-core`; this type
//! covers what the API layer decides on its own.

use thiserror::Error;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Principal is outside the requested organization or campus.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Malformed request input.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden(_) => 403,
            Self::Validation(_) => 400,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}
