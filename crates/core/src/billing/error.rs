//! Billing error types for posting, ledger, and reconciliation failures.
//!
//! Every variant maps to a stable error code that client UIs rely on to tell
//! "already paid" apart from "duplicate submission" and from system errors.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::ChallanStatus;
use crate::error::ErrorCategory;

/// Errors that can occur while billing students or collecting payments.
#[derive(Debug, Error)]
pub enum BillingError {
    // ========== Validation Errors ==========
    /// No active students matched the posting scope.
    #[error("No active students found for campus {campus_id}, grade {grade}")]
    NoStudents {
        /// Campus being billed.
        campus_id: Uuid,
        /// Grade being billed.
        grade: String,
    },

    /// No active fee rules matched the posting scope.
    #[error("No active fee rules found for campus {campus_id}, grade {grade}")]
    NoFeeRules {
        /// Campus being billed.
        campus_id: Uuid,
        /// Grade being billed.
        grade: String,
    },

    /// Billing period is not `YYYY-MM` or is out of range.
    #[error("Invalid billing period: {0}")]
    InvalidBillingPeriod(String),

    /// Due date precedes the issue date.
    #[error("Due date {due_date} is before issue date {issue_date}")]
    InvalidDueDate {
        /// Requested issue date.
        issue_date: chrono::NaiveDate,
        /// Requested due date.
        due_date: chrono::NaiveDate,
    },

    /// Amount must be strictly positive and fit the stored precision.
    #[error("Invalid amount {0}: must be greater than zero with at most 4 decimal places")]
    InvalidAmount(Decimal),

    /// A required text field was empty.
    #[error("Field {0} must not be empty")]
    MissingField(&'static str),

    // ========== Challan State Errors ==========
    /// Challan does not exist or belongs to another organization.
    #[error("Challan not found: {0}")]
    ChallanNotFound(Uuid),

    /// Challan has nothing left to collect.
    #[error("Challan {0} is already paid")]
    ChallanAlreadyPaid(Uuid),

    /// Challan was cancelled and accepts no payments.
    #[error("Challan {0} is cancelled")]
    ChallanCancelled(Uuid),

    /// Payment exceeds the outstanding amount.
    #[error("Payment of {amount} exceeds remaining balance {remaining}")]
    Overpayment {
        /// Submitted amount.
        amount: Decimal,
        /// Amount still owed on the challan.
        remaining: Decimal,
    },

    /// Challan status would regress or jump illegally.
    #[error("Invalid challan status transition from {from} to {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: ChallanStatus,
        /// Requested status.
        to: ChallanStatus,
    },

    /// Challan has collected money and cannot be cancelled.
    #[error("Cannot cancel challan {0}: payments have been recorded")]
    CannotCancelPaidChallan(Uuid),

    // ========== Conflict Errors ==========
    /// Same payment submitted twice.
    #[error("Duplicate payment submission for challan {challan_id} with reference {reference_number}")]
    DuplicatePayment {
        /// Challan the payment targeted.
        challan_id: Uuid,
        /// Reference number of the duplicate.
        reference_number: String,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoStudents { .. } => "NO_STUDENTS",
            Self::NoFeeRules { .. } => "NO_FEE_RULES",
            Self::InvalidBillingPeriod(_) => "INVALID_BILLING_PERIOD",
            Self::InvalidDueDate { .. } => "INVALID_DUE_DATE",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::ChallanNotFound(_) => "CHALLAN_NOT_FOUND",
            Self::ChallanAlreadyPaid(_) => "CHALLAN_ALREADY_PAID",
            Self::ChallanCancelled(_) => "CHALLAN_CANCELLED",
            Self::Overpayment { .. } => "OVERPAYMENT",
            Self::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            Self::CannotCancelPaidChallan(_) => "CANNOT_CANCEL_PAID_CHALLAN",
            Self::DuplicatePayment { .. } => "DUPLICATE_PAYMENT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoStudents { .. }
            | Self::NoFeeRules { .. }
            | Self::InvalidBillingPeriod(_)
            | Self::InvalidDueDate { .. }
            | Self::InvalidAmount(_)
            | Self::MissingField(_) => ErrorCategory::Validation,

            Self::ChallanNotFound(_) => ErrorCategory::NotFound,

            Self::ChallanAlreadyPaid(_)
            | Self::ChallanCancelled(_)
            | Self::Overpayment { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::CannotCancelPaidChallan(_)
            | Self::DuplicatePayment { .. } => ErrorCategory::Conflict,

            Self::Database(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 422 - request was well-formed but the posting scope is empty
            Self::NoStudents { .. } | Self::NoFeeRules { .. } => 422,
            _ => self.category().http_status_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_error_codes() {
        let challan_id = Uuid::nil();
        assert_eq!(
            BillingError::ChallanAlreadyPaid(challan_id).error_code(),
            "CHALLAN_ALREADY_PAID"
        );
        assert_eq!(
            BillingError::DuplicatePayment {
                challan_id,
                reference_number: "TX-1".into(),
            }
            .error_code(),
            "DUPLICATE_PAYMENT"
        );
        assert_eq!(
            BillingError::Overpayment {
                amount: dec!(10),
                remaining: dec!(5),
            }
            .error_code(),
            "OVERPAYMENT"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(
            BillingError::NoStudents {
                campus_id: Uuid::nil(),
                grade: "5".into(),
            }
            .http_status_code(),
            422
        );
        assert_eq!(BillingError::InvalidAmount(dec!(0)).http_status_code(), 400);
        assert_eq!(BillingError::ChallanNotFound(Uuid::nil()).http_status_code(), 404);
        assert_eq!(BillingError::ChallanAlreadyPaid(Uuid::nil()).http_status_code(), 409);
        assert_eq!(BillingError::Database("down".into()).http_status_code(), 500);
    }

    #[test]
    fn test_error_display() {
        let err = BillingError::Overpayment {
            amount: dec!(700.00),
            remaining: dec!(600.00),
        };
        assert_eq!(
            err.to_string(),
            "Payment of 700.00 exceeds remaining balance 600.00"
        );

        let err = BillingError::InvalidStatusTransition {
            from: ChallanStatus::Paid,
            to: ChallanStatus::PartiallyPaid,
        };
        assert_eq!(
            err.to_string(),
            "Invalid challan status transition from PAID to PARTIALLY_PAID"
        );
    }
}
