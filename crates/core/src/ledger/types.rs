//! Ledger domain types.
//!
//! The ledger is append-only: an entry is never updated or deleted, and a
//! correction is always a new entry.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What caused a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    /// A challan was issued.
    ChallanCreated,
    /// A payment was reconciled.
    PaymentReceived,
    /// Manual correction.
    Adjustment,
    /// Money returned to the payer.
    Refund,
    /// Amount forgiven, including cancelled challans.
    Waiver,
}

impl LedgerEntryType {
    /// Returns the stored name of the entry type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChallanCreated => "CHALLAN_CREATED",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::Adjustment => "ADJUSTMENT",
            Self::Refund => "REFUND",
            Self::Waiver => "WAIVER",
        }
    }
}

/// Side of the book an entry lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryDirection {
    /// Increases what the student owes.
    Debit,
    /// Decreases what the student owes.
    Credit,
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => f.write_str("DEBIT"),
            Self::Credit => f.write_str("CREDIT"),
        }
    }
}

/// Kind of record a `reference_id` points at.
pub mod reference_type {
    /// `reference_id` is a fee challan.
    pub const CHALLAN: &str = "FEE_CHALLAN";
    /// `reference_id` is a payment record.
    pub const PAYMENT: &str = "PAYMENT_RECORD";
    /// `reference_id` is a cancelled fee challan.
    pub const CANCELLATION: &str = "CHALLAN_CANCELLATION";
}

/// A persisted ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Campus the student belongs to.
    pub campus_id: Uuid,
    /// Student whose balance this entry moves.
    pub student_id: Uuid,
    /// Related challan, if any.
    pub challan_id: Option<Uuid>,
    /// Cause of the entry.
    pub entry_type: LedgerEntryType,
    /// Debit or credit.
    pub direction: EntryDirection,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Causing record.
    pub reference_id: Option<Uuid>,
    /// Kind of the causing record.
    pub reference_type: Option<String>,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
    /// Insertion time.
    pub created_at: DateTime<Utc>,
}

/// A ledger line about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Pre-assigned entry ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Campus the student belongs to.
    pub campus_id: Uuid,
    /// Student whose balance this entry moves.
    pub student_id: Uuid,
    /// Related challan, if any.
    pub challan_id: Option<Uuid>,
    /// Cause of the entry.
    pub entry_type: LedgerEntryType,
    /// Debit or credit.
    pub direction: EntryDirection,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Causing record.
    pub reference_id: Option<Uuid>,
    /// Kind of the causing record.
    pub reference_type: Option<String>,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Free-form description.
    pub description: Option<String>,
}

impl NewLedgerEntry {
    /// Converts the pending entry into its persisted form.
    #[must_use]
    pub fn into_entry(self, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: self.id,
            organization_id: self.organization_id,
            campus_id: self.campus_id,
            student_id: self.student_id,
            challan_id: self.challan_id,
            entry_type: self.entry_type,
            direction: self.direction,
            amount: self.amount,
            reference_id: self.reference_id,
            reference_type: self.reference_type,
            entry_date: self.entry_date,
            description: self.description,
            created_at,
        }
    }
}

/// Materialized per-student totals.
///
/// Always updated in the same transaction as the entry that changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentFinancialSummary {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Student.
    pub student_id: Uuid,
    /// Sum of all debit entries.
    pub total_debit: Decimal,
    /// Sum of all credit entries.
    pub total_credit: Decimal,
    /// `total_debit - total_credit`.
    pub balance: Decimal,
}

/// A student's ledger with its summary, checked against each other.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatement {
    /// Student.
    pub student_id: Uuid,
    /// Entries ordered by entry date, then insertion.
    pub entries: Vec<LedgerEntry>,
    /// Stored summary (zeroed when the student has no entries yet).
    pub summary: StudentFinancialSummary,
    /// Balance recomputed from `entries`.
    pub computed_balance: Decimal,
    /// Whether the stored summary matches the entries.
    pub verified: bool,
}
