//! Revenue cycle persistence seam.

use uuid::Uuid;

use super::error::RevenueCycleError;
use super::types::{
    AdjustmentInput, AdjustmentOutcome, BillingPlan, CycleClosure, CycleInsert, CycleWindow,
    NewRevenueCycle, RevenueAdjustment, RevenueCalculationMode, RevenueCycle, RevenueCycleMetrics,
};

/// Repository trait for revenue cycles.
///
/// This trait is implemented by the db crate.
pub trait RevenueCycleStore: Send + Sync {
    /// Live billing plan for an organization.
    fn billing_plan(
        &self,
        organization_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<BillingPlan>, RevenueCycleError>> + Send;

    /// Inserts a cycle; a unique violation on (organization, month, year)
    /// returns the existing row as `CycleInsert::AlreadyExists`.
    fn insert_cycle(
        &self,
        cycle: NewRevenueCycle,
    ) -> impl std::future::Future<Output = Result<CycleInsert, RevenueCycleError>> + Send;

    /// Cycle by ID within an organization.
    fn find_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Option<RevenueCycle>, RevenueCycleError>> + Send;

    /// Cycle for a month within an organization.
    fn find_cycle_for_period(
        &self,
        organization_id: Uuid,
        month: u32,
        year: i32,
    ) -> impl std::future::Future<Output = Result<Option<RevenueCycle>, RevenueCycleError>> + Send;

    /// Cycles for an organization, newest period first.
    fn list_cycles(
        &self,
        organization_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<RevenueCycle>, RevenueCycleError>> + Send;

    /// Aggregates challans and payments over a window.
    fn period_metrics(
        &self,
        organization_id: Uuid,
        window: CycleWindow,
        mode: RevenueCalculationMode,
    ) -> impl std::future::Future<Output = Result<RevenueCycleMetrics, RevenueCycleError>> + Send;

    /// Stores refreshed metrics on a cycle that is still open.
    ///
    /// Returns `None` if the cycle is no longer open.
    fn save_open_metrics(
        &self,
        cycle: RevenueCycle,
    ) -> impl std::future::Future<Output = Result<Option<RevenueCycle>, RevenueCycleError>> + Send;

    /// Flips an open cycle to closed with the given final values.
    ///
    /// The write is conditional on the row still being open; losing that
    /// race yields `RevenueCycleError::CycleAlreadyClosed`.
    fn close_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
        closure: CycleClosure,
    ) -> impl std::future::Future<Output = Result<RevenueCycle, RevenueCycleError>> + Send;

    /// Records an adjustment and increments revenue in one transaction.
    ///
    /// Implementations lock the cycle row and plan the change with
    /// `RevenueCycleLifecycle::plan_adjustment`.
    fn apply_adjustment(
        &self,
        input: AdjustmentInput,
    ) -> impl std::future::Future<Output = Result<AdjustmentOutcome, RevenueCycleError>> + Send;

    /// Adjustments recorded on a cycle, oldest first.
    fn list_adjustments(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<RevenueAdjustment>, RevenueCycleError>> + Send;
}
