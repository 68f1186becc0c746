//! Payment domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::billing::{ChallanStatus, FeeChallan};
use crate::ledger::NewLedgerEntry;

/// Settlement state of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting settlement.
    Pending,
    /// Applied to the challan and ledger.
    Reconciled,
    /// Rejected by the channel.
    Failed,
}

impl PaymentStatus {
    /// Returns the stored name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reconciled => "RECONCILED",
            Self::Failed => "FAILED",
        }
    }
}

/// One payment against a challan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Payment record ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Challan the payment settles.
    pub challan_id: Uuid,
    /// Amount paid.
    pub amount: Decimal,
    /// ISO 4217 code.
    pub currency: String,
    /// Channel (e.g., "BANK", "CASH").
    pub payment_channel: String,
    /// Gateway that processed the payment, if any.
    pub gateway: Option<String>,
    /// Bank or gateway reference.
    pub reference_number: String,
    /// Business date of the payment.
    pub payment_date: NaiveDate,
    /// Settlement timestamp.
    pub paid_at: DateTime<Utc>,
    /// Settlement state.
    pub status: PaymentStatus,
    /// Operator notes.
    pub notes: Option<String>,
    /// Principal that recorded the payment.
    pub recorded_by: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields that identify a payment submission.
///
/// Two submissions with the same key are the same payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentNaturalKey {
    /// Challan.
    pub challan_id: Uuid,
    /// Bank or gateway reference, trimmed.
    pub reference_number: String,
    /// Business date.
    pub payment_date: NaiveDate,
    /// Amount, normalized so `400` and `400.00` are equal.
    pub amount: Decimal,
    /// Channel, upper-cased.
    pub payment_channel: String,
}

impl PaymentNaturalKey {
    /// Returns true if `record` was submitted under this key.
    #[must_use]
    pub fn matches(&self, record: &PaymentRecord) -> bool {
        record.challan_id == self.challan_id
            && record.reference_number == self.reference_number
            && record.payment_date == self.payment_date
            && record.amount.normalize() == self.amount
            && record.payment_channel == self.payment_channel
    }
}

/// Input for reconciling a payment.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentInput {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Challan being paid.
    pub challan_id: Uuid,
    /// Amount paid; strictly positive.
    pub amount: Decimal,
    /// Business date.
    pub payment_date: NaiveDate,
    /// Exact settlement time; midnight UTC of `payment_date` when `None`.
    pub paid_at: Option<DateTime<Utc>>,
    /// Channel (e.g., "BANK", "CASH").
    pub payment_channel: String,
    /// Bank or gateway reference.
    pub reference_number: String,
    /// ISO 4217 code; configured default when `None`.
    pub currency: Option<String>,
    /// Gateway, if any.
    pub gateway: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
    /// Principal recording the payment.
    pub recorded_by: Option<Uuid>,
}

impl ReconcilePaymentInput {
    /// Natural key of this submission.
    #[must_use]
    pub fn natural_key(&self) -> PaymentNaturalKey {
        PaymentNaturalKey {
            challan_id: self.challan_id,
            reference_number: self.reference_number.trim().to_string(),
            payment_date: self.payment_date,
            amount: self.amount.normalize(),
            payment_channel: self.payment_channel.trim().to_ascii_uppercase(),
        }
    }
}

/// Writes a reconciliation performs, computed before any of them happen.
#[derive(Debug, Clone)]
pub struct PaymentPlan {
    /// Record to insert.
    pub payment: PaymentRecord,
    /// Challan with the new paid amount and status.
    pub challan: FeeChallan,
    /// `PAYMENT_RECEIVED` credit to append.
    pub credit: NewLedgerEntry,
}

impl PaymentPlan {
    /// Result reported to the caller once the plan is committed.
    #[must_use]
    pub fn result(&self) -> ReconciliationResult {
        ReconciliationResult {
            payment_record_id: self.payment.id,
            challan_id: self.challan.id,
            challan_status: self.challan.status,
            paid_amount: self.challan.paid_amount,
            remaining_amount: self.challan.remaining_amount(),
            ledger_entry_id: self.credit.id,
        }
    }
}

/// Outcome of a committed reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// Inserted payment record.
    pub payment_record_id: Uuid,
    /// Settled challan.
    pub challan_id: Uuid,
    /// Challan status after the payment.
    pub challan_status: ChallanStatus,
    /// Challan paid amount after the payment.
    pub paid_amount: Decimal,
    /// Amount still owed.
    pub remaining_amount: Decimal,
    /// Appended credit entry.
    pub ledger_entry_id: Uuid,
}
