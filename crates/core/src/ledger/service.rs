//! Ledger service: entry construction and statement verification.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::LedgerTotals;
use super::store::LedgerStore;
use super::types::{
    EntryDirection, LedgerEntry, LedgerEntryType, LedgerStatement, NewLedgerEntry,
    StudentFinancialSummary, reference_type,
};
use crate::billing::{BillingError, FeeChallan};

/// Stateless ledger helpers.
///
/// Builders here are the only place entries are shaped, so each entry type
/// always carries the same direction and reference kind.
pub struct LedgerService;

impl LedgerService {
    /// Debit raised when a challan is issued.
    #[must_use]
    pub fn challan_debit(challan: &FeeChallan) -> NewLedgerEntry {
        NewLedgerEntry {
            id: Uuid::now_v7(),
            organization_id: challan.organization_id,
            campus_id: challan.campus_id,
            student_id: challan.student_id,
            challan_id: Some(challan.id),
            entry_type: LedgerEntryType::ChallanCreated,
            direction: EntryDirection::Debit,
            amount: challan.total_amount,
            reference_id: Some(challan.id),
            reference_type: Some(reference_type::CHALLAN.to_string()),
            entry_date: challan.issue_date,
            description: Some(format!("Challan {} issued", challan.challan_no)),
        }
    }

    /// Credit recorded for a reconciled payment.
    #[must_use]
    pub fn payment_credit(
        challan: &FeeChallan,
        payment_record_id: Uuid,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> NewLedgerEntry {
        NewLedgerEntry {
            id: Uuid::now_v7(),
            organization_id: challan.organization_id,
            campus_id: challan.campus_id,
            student_id: challan.student_id,
            challan_id: Some(challan.id),
            entry_type: LedgerEntryType::PaymentReceived,
            direction: EntryDirection::Credit,
            amount,
            reference_id: Some(payment_record_id),
            reference_type: Some(reference_type::PAYMENT.to_string()),
            entry_date: payment_date,
            description: Some(format!("Payment against challan {}", challan.challan_no)),
        }
    }

    /// Credit that offsets a cancelled challan's debit.
    #[must_use]
    pub fn cancellation_waiver(challan: &FeeChallan, entry_date: NaiveDate, reason: &str) -> NewLedgerEntry {
        NewLedgerEntry {
            id: Uuid::now_v7(),
            organization_id: challan.organization_id,
            campus_id: challan.campus_id,
            student_id: challan.student_id,
            challan_id: Some(challan.id),
            entry_type: LedgerEntryType::Waiver,
            direction: EntryDirection::Credit,
            amount: challan.total_amount,
            reference_id: Some(challan.id),
            reference_type: Some(reference_type::CANCELLATION.to_string()),
            entry_date,
            description: Some(format!("Challan {} cancelled: {reason}", challan.challan_no)),
        }
    }

    /// Builds a statement and checks the stored summary against the entries.
    #[must_use]
    pub fn statement(
        organization_id: Uuid,
        student_id: Uuid,
        entries: Vec<LedgerEntry>,
        summary: Option<StudentFinancialSummary>,
    ) -> LedgerStatement {
        let totals = LedgerTotals::from_entries(&entries);
        let summary =
            summary.unwrap_or_else(|| StudentFinancialSummary::empty(organization_id, student_id));
        let verified = summary.is_consistent()
            && summary.total_debit == totals.debit
            && summary.total_credit == totals.credit;

        LedgerStatement {
            student_id,
            entries,
            summary,
            computed_balance: totals.balance(),
            verified,
        }
    }

    /// Loads a student's ledger and summary from the store.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn load_statement<S: LedgerStore>(
        store: &S,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<LedgerStatement, BillingError> {
        let entries = store.student_entries(organization_id, student_id).await?;
        let summary = store.student_summary(organization_id, student_id).await?;
        let statement = Self::statement(organization_id, student_id, entries, summary);

        if !statement.verified {
            tracing::error!(
                organization_id = %organization_id,
                student_id = %student_id,
                stored_balance = %statement.summary.balance,
                computed_balance = %statement.computed_balance,
                "student financial summary drifted from ledger"
            );
        }
        Ok(statement)
    }
}
