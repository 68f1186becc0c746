//! Billing persistence seam.

use chrono::{DateTime, Utc};
use sairex_shared::types::PageRequest;
use uuid::Uuid;

use super::error::BillingError;
use super::types::{CancelChallanInput, ChallanFilter, ChallanInsert, FeeChallan, NewChallan, Student};
use crate::ledger::NewLedgerEntry;

/// Repository trait for challans and the students they bill.
///
/// This trait is implemented by the db crate. Methods that write challans
/// must apply the challan, its ledger entry, and the student summary in
/// one transaction.
pub trait BillingStore: Send + Sync {
    /// Active students for a campus and grade.
    fn active_students(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
        grade: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Student>, BillingError>> + Send;

    /// Challan with the given number, if one exists.
    fn find_challan_by_number(
        &self,
        organization_id: Uuid,
        challan_no: &str,
    ) -> impl std::future::Future<Output = Result<Option<FeeChallan>, BillingError>> + Send;

    /// Inserts a challan together with its `CHALLAN_CREATED` debit.
    ///
    /// A unique violation on the challan number yields
    /// `ChallanInsert::AlreadyExists` rather than an error.
    fn insert_challan(
        &self,
        challan: NewChallan,
        debit: NewLedgerEntry,
    ) -> impl std::future::Future<Output = Result<ChallanInsert, BillingError>> + Send;

    /// Challan by ID within an organization.
    fn find_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<FeeChallan>, BillingError>> + Send;

    /// Page of challans, newest first, with the total match count.
    fn list_challans(
        &self,
        organization_id: Uuid,
        filter: ChallanFilter,
        page: PageRequest,
    ) -> impl std::future::Future<Output = Result<(Vec<FeeChallan>, u64), BillingError>> + Send;

    /// Cancels a challan and appends its waiver credit.
    ///
    /// Implementations lock the challan row and plan the change with
    /// `ChallanLifecycle::plan_cancellation`.
    fn cancel_challan(
        &self,
        input: CancelChallanInput,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<FeeChallan, BillingError>> + Send;
}
