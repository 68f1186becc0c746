//! Revenue cycle error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ErrorCategory;

/// Errors that can occur while managing revenue cycles.
#[derive(Debug, Error)]
pub enum RevenueCycleError {
    /// Cycle does not exist or belongs to another organization.
    #[error("Revenue cycle not found: {0}")]
    CycleNotFound(Uuid),

    /// No cycle exists for the requested month.
    #[error("No revenue cycle for {year:04}-{month:02}")]
    PeriodNotFound {
        /// Requested month.
        month: u32,
        /// Requested year.
        year: i32,
    },

    /// Cycle was closed before; closing is a one-time transition.
    #[error("Revenue cycle {0} is already closed")]
    CycleAlreadyClosed(Uuid),

    /// Adjustments apply only to closed cycles.
    #[error("Revenue cycle {0} is not closed")]
    CycleNotClosed(Uuid),

    /// Organization has no billing plan to snapshot.
    #[error("Organization {0} has no billing plan")]
    NoBillingPlan(Uuid),

    /// Month outside 1..=12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// Year outside 2000..=9999.
    #[error("Invalid year: {0}")]
    InvalidYear(i32),

    /// Adjustment reason was blank.
    #[error("Adjustment reason must not be empty")]
    EmptyAdjustmentReason,

    /// Adjustment amount was zero.
    #[error("Adjustment amount must not be zero")]
    ZeroAdjustment,

    /// Adjustment amount does not fit the stored precision.
    #[error("Invalid adjustment amount {0}: at most 4 decimal places allowed")]
    InvalidAdjustmentAmount(Decimal),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RevenueCycleError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CycleNotFound(_) | Self::PeriodNotFound { .. } => "CYCLE_NOT_FOUND",
            Self::CycleAlreadyClosed(_) => "CYCLE_ALREADY_CLOSED",
            Self::CycleNotClosed(_) => "CYCLE_NOT_CLOSED",
            Self::NoBillingPlan(_) => "NO_BILLING_PLAN",
            Self::InvalidMonth(_) => "INVALID_MONTH",
            Self::InvalidYear(_) => "INVALID_YEAR",
            Self::EmptyAdjustmentReason => "EMPTY_ADJUSTMENT_REASON",
            Self::ZeroAdjustment => "ZERO_ADJUSTMENT",
            Self::InvalidAdjustmentAmount(_) => "INVALID_AMOUNT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidMonth(_)
            | Self::InvalidYear(_)
            | Self::EmptyAdjustmentReason
            | Self::ZeroAdjustment
            | Self::InvalidAdjustmentAmount(_)
            | Self::NoBillingPlan(_) => ErrorCategory::Validation,
            Self::CycleNotFound(_) | Self::PeriodNotFound { .. } => ErrorCategory::NotFound,
            Self::CycleAlreadyClosed(_) | Self::CycleNotClosed(_) => ErrorCategory::Conflict,
            Self::Database(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NoBillingPlan(_) => 422,
            _ => self.category().http_status_code(),
        }
    }
}
