//! Read access to persisted ledger state.

use uuid::Uuid;

use super::types::{LedgerEntry, StudentFinancialSummary};
use crate::billing::BillingError;

/// Repository trait for ledger reads.
///
/// Writes never go through this trait: entries are appended only as part
/// of the posting, reconciliation, and cancellation units of work.
pub trait LedgerStore: Send + Sync {
    /// Entries for a student, oldest first.
    fn student_entries(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<LedgerEntry>, BillingError>> + Send;

    /// Stored summary for a student, if one exists.
    fn student_summary(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<StudentFinancialSummary>, BillingError>> + Send;
}
