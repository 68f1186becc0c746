//! Billing domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::BillingPeriod;

/// Collection state of a challan.
///
/// Valid transitions:
/// - Unpaid → PartiallyPaid → Paid (payments)
/// - Unpaid → Paid (payment of the full amount)
/// - Unpaid → Cancelled (cancellation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallanStatus {
    /// Nothing collected.
    Unpaid,
    /// Some but not all of the total collected.
    PartiallyPaid,
    /// Fully collected.
    Paid,
    /// Withdrawn before any collection.
    Cancelled,
}

impl ChallanStatus {
    /// Returns the stored name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::PartiallyPaid => "PARTIALLY_PAID",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from its stored name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UNPAID" => Some(Self::Unpaid),
            "PARTIALLY_PAID" => Some(Self::PartiallyPaid),
            "PAID" => Some(Self::Paid),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for ChallanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A student eligible for billing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Student ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Campus the student is enrolled at.
    pub campus_id: Uuid,
    /// Current grade.
    pub grade: String,
    /// Display name.
    pub full_name: String,
}

/// One invoice for one student for one billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeChallan {
    /// Challan ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Campus the student is billed at.
    pub campus_id: Uuid,
    /// Billed student.
    pub student_id: Uuid,
    /// Deterministic, globally unique number.
    pub challan_no: String,
    /// Billing period (`YYYY-MM`).
    pub billing_period: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Amount fixed at issuance.
    pub total_amount: Decimal,
    /// Amount collected so far; never decreases.
    pub paid_amount: Decimal,
    /// Collection state.
    pub status: ChallanStatus,
    /// Principal that posted the challan; `None` for system runs.
    pub generated_by: Option<Uuid>,
    /// When the challan was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// Why the challan was cancelled.
    pub cancellation_reason: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl FeeChallan {
    /// Amount still owed.
    #[must_use]
    pub fn remaining_amount(&self) -> Decimal {
        (self.total_amount - self.paid_amount).max(Decimal::ZERO)
    }
}

/// A challan about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChallan {
    /// Pre-assigned challan ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Campus the student is billed at.
    pub campus_id: Uuid,
    /// Billed student.
    pub student_id: Uuid,
    /// Deterministic challan number.
    pub challan_no: String,
    /// Billing period.
    pub billing_period: BillingPeriod,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Sum of every applicable fee rule.
    pub total_amount: Decimal,
    /// Principal that posted the challan.
    pub generated_by: Option<Uuid>,
}

impl NewChallan {
    /// Converts the pending challan into its persisted form.
    #[must_use]
    pub fn into_challan(self, created_at: DateTime<Utc>) -> FeeChallan {
        FeeChallan {
            id: self.id,
            organization_id: self.organization_id,
            campus_id: self.campus_id,
            student_id: self.student_id,
            challan_no: self.challan_no,
            billing_period: self.billing_period.to_string(),
            issue_date: self.issue_date,
            due_date: self.due_date,
            total_amount: self.total_amount,
            paid_amount: Decimal::ZERO,
            status: ChallanStatus::Unpaid,
            generated_by: self.generated_by,
            cancelled_at: None,
            cancellation_reason: None,
            created_at,
        }
    }
}

/// Outcome of inserting a challan.
#[derive(Debug, Clone)]
pub enum ChallanInsert {
    /// Challan, debit entry, and summary were written.
    Created(FeeChallan),
    /// A challan with the same number already exists.
    AlreadyExists,
}

/// Input for a posting run.
#[derive(Debug, Clone)]
pub struct PostingRequest {
    /// Organization being billed.
    pub organization_id: Uuid,
    /// Campus being billed.
    pub campus_id: Uuid,
    /// Grade being billed.
    pub grade: String,
    /// Period being billed.
    pub billing_period: BillingPeriod,
    /// Issue date; today (UTC) when `None`.
    pub issue_date: Option<NaiveDate>,
    /// Due date; must not precede the issue date.
    pub due_date: NaiveDate,
    /// Principal triggering the run; `None` for system runs.
    pub generated_by: Option<Uuid>,
}

/// A student whose challan could not be written.
#[derive(Debug, Clone, Serialize)]
pub struct PostingFailure {
    /// Student.
    pub student_id: Uuid,
    /// Error message.
    pub error: String,
}

/// Result of a posting run.
///
/// `generated_count + skipped_existing + failed.len() == students_found`.
#[derive(Debug, Clone, Serialize)]
pub struct PostingReport {
    /// Challans created by this run.
    pub generated_count: usize,
    /// Students in scope.
    pub students_found: usize,
    /// Students that already had this period's challan.
    pub skipped_existing: usize,
    /// Students whose challan failed to write.
    pub failed: Vec<PostingFailure>,
    /// Amount billed to each student.
    pub total_bill_amount: Decimal,
    /// Numbers of the challans created by this run.
    pub challan_numbers: Vec<String>,
}

/// Filters for listing challans.
#[derive(Debug, Clone, Default)]
pub struct ChallanFilter {
    /// Only this student.
    pub student_id: Option<Uuid>,
    /// Only this status.
    pub status: Option<ChallanStatus>,
    /// Only this period (`YYYY-MM`).
    pub billing_period: Option<String>,
}

/// Input for cancelling a challan.
#[derive(Debug, Clone)]
pub struct CancelChallanInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Challan to cancel.
    pub challan_id: Uuid,
    /// Reason recorded on the challan and the waiver entry.
    pub reason: String,
    /// Principal cancelling the challan.
    pub cancelled_by: Uuid,
}
