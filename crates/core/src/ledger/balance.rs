//! Student balance arithmetic.
//!
//! `balance == total_debit - total_credit` holds after every `apply`, and a
//! summary built by folding a student's entries equals the stored one.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{EntryDirection, LedgerEntry, NewLedgerEntry, StudentFinancialSummary};
use crate::billing::BillingError;

impl StudentFinancialSummary {
    /// Creates a zeroed summary for a student without entries.
    #[must_use]
    pub fn empty(organization_id: Uuid, student_id: Uuid) -> Self {
        Self {
            organization_id,
            student_id,
            total_debit: Decimal::ZERO,
            total_credit: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }

    /// Applies one entry to the running totals.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidAmount` if the entry amount is not positive,
    /// or `BillingError::Internal` if the entry belongs to another student.
    pub fn apply(&mut self, entry: &NewLedgerEntry) -> Result<(), BillingError> {
        if entry.amount <= Decimal::ZERO {
            return Err(BillingError::InvalidAmount(entry.amount));
        }
        if entry.student_id != self.student_id {
            return Err(BillingError::Internal(format!(
                "ledger entry for student {} applied to summary of {}",
                entry.student_id, self.student_id
            )));
        }

        match entry.direction {
            EntryDirection::Debit => self.total_debit += entry.amount,
            EntryDirection::Credit => self.total_credit += entry.amount,
        }
        self.balance = self.total_debit - self.total_credit;
        Ok(())
    }

    /// Returns true if the stored balance is consistent with its totals.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.balance == self.total_debit - self.total_credit
    }
}

/// Debit and credit totals for a set of entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerTotals {
    /// Sum of debit amounts.
    pub debit: Decimal,
    /// Sum of credit amounts.
    pub credit: Decimal,
}

impl LedgerTotals {
    /// Sums entries by direction.
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        entries
            .into_iter()
            .fold(Self::default(), |mut totals, entry| {
                match entry.direction {
                    EntryDirection::Debit => totals.debit += entry.amount,
                    EntryDirection::Credit => totals.credit += entry.amount,
                }
                totals
            })
    }

    /// `debit - credit`.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.debit - self.credit
    }
}
