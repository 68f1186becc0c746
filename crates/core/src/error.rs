//! Error classification shared by the domain error enums.

use serde::Serialize;

/// Coarse class of a domain error, stable for client UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid input. Never retried automatically.
    Validation,
    /// Duplicate submission or state conflict.
    Conflict,
    /// Entity absent or outside the caller's tenant.
    NotFound,
    /// Caller lacks permission.
    Forbidden,
    /// Storage or unexpected failure.
    Internal,
}

impl ErrorCategory {
    /// Returns the default HTTP status for the category.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Conflict => 409,
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::Internal => 500,
        }
    }
}
