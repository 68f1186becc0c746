//! Revenue cycle service: create, refresh, close, adjust.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::error::RevenueCycleError;
use super::lifecycle::RevenueCycleLifecycle;
use super::store::RevenueCycleStore;
use super::types::{
    AdjustmentInput, AdjustmentOutcome, BillingPlan, CycleCreation, CycleInsert, LiveMetrics,
    RevenueAdjustment, RevenueCycle, RevenueCycleMetrics,
};

/// Service managing monthly revenue cycles.
pub struct RevenueCycleService<S> {
    store: Arc<S>,
    default_closing_day: u32,
}

impl<S> Clone for RevenueCycleService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_closing_day: self.default_closing_day,
        }
    }
}

impl<S: RevenueCycleStore> RevenueCycleService<S> {
    /// Create a new revenue cycle service.
    #[must_use]
    pub fn new(store: Arc<S>, default_closing_day: u32) -> Self {
        Self {
            store,
            default_closing_day,
        }
    }

    /// Closing day used when a plan has none.
    #[must_use]
    pub const fn default_closing_day(&self) -> u32 {
        self.default_closing_day
    }

    async fn billing_plan(&self, organization_id: Uuid) -> Result<BillingPlan, RevenueCycleError> {
        self.store
            .billing_plan(organization_id)
            .await?
            .ok_or(RevenueCycleError::NoBillingPlan(organization_id))
    }

    /// Create the OPEN cycle for a month from the organization's current plan.
    ///
    /// An existing cycle for the same month is returned with `created = false`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth`/`InvalidYear`, `NoBillingPlan`, or store errors.
    pub async fn create_monthly_cycle(
        &self,
        organization_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<CycleCreation, RevenueCycleError> {
        RevenueCycleLifecycle::validate_period(month, year)?;

        if let Some(cycle) = self
            .store
            .find_cycle_for_period(organization_id, month, year)
            .await?
        {
            return Ok(CycleCreation {
                cycle,
                created: false,
            });
        }

        let plan = self.billing_plan(organization_id).await?;
        let new_cycle =
            RevenueCycleLifecycle::snapshot(&plan, month, year, self.default_closing_day)?;

        match self.store.insert_cycle(new_cycle).await? {
            CycleInsert::Created(cycle) => {
                tracing::info!(
                    organization_id = %organization_id,
                    cycle_id = %cycle.id,
                    month,
                    year,
                    mode = %cycle.revenue_calculation_mode_used,
                    "revenue cycle created"
                );
                Ok(CycleCreation {
                    cycle,
                    created: true,
                })
            }
            CycleInsert::AlreadyExists(cycle) => Ok(CycleCreation {
                cycle,
                created: false,
            }),
        }
    }

    async fn metrics_for(&self, cycle: &RevenueCycle) -> Result<RevenueCycleMetrics, RevenueCycleError> {
        let window = RevenueCycleLifecycle::period_window(cycle.month, cycle.year)?;
        self.store
            .period_metrics(cycle.organization_id, window, cycle.revenue_calculation_mode_used)
            .await
    }

    async fn refresh_loaded(&self, cycle: RevenueCycle) -> Result<LiveMetrics, RevenueCycleError> {
        let metrics = self.metrics_for(&cycle).await?;

        if cycle.is_closed() {
            return Ok(LiveMetrics {
                cycle,
                metrics,
                persisted: false,
            });
        }

        let refreshed = RevenueCycleLifecycle::refresh(&cycle, metrics, Utc::now())?;
        match self.store.save_open_metrics(refreshed).await? {
            Some(saved) => Ok(LiveMetrics {
                cycle: saved,
                metrics,
                persisted: true,
            }),
            // Closed concurrently between read and write.
            None => Ok(LiveMetrics {
                cycle,
                metrics,
                persisted: false,
            }),
        }
    }

    /// Compute live metrics for a month's cycle, persisting them if it is open.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if no cycle exists for the month.
    pub async fn calculate_live_metrics(
        &self,
        organization_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<LiveMetrics, RevenueCycleError> {
        RevenueCycleLifecycle::validate_period(month, year)?;
        let cycle = self
            .store
            .find_cycle_for_period(organization_id, month, year)
            .await?
            .ok_or(RevenueCycleError::PeriodNotFound { month, year })?;
        self.refresh_loaded(cycle).await
    }

    /// Refresh metrics for a cycle by ID.
    ///
    /// # Errors
    ///
    /// Returns `CycleNotFound` if absent or in another organization.
    pub async fn refresh_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<LiveMetrics, RevenueCycleError> {
        let cycle = self.get_cycle(organization_id, cycle_id).await?;
        self.refresh_loaded(cycle).await
    }

    /// Close an open cycle with final metrics and the latest plan terms.
    ///
    /// # Errors
    ///
    /// Returns `CycleNotFound`, `CycleAlreadyClosed`, or `NoBillingPlan`.
    pub async fn close_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<RevenueCycle, RevenueCycleError> {
        let cycle = self.get_cycle(organization_id, cycle_id).await?;
        RevenueCycleLifecycle::ensure_open(&cycle)?;

        let plan = self.billing_plan(organization_id).await?;
        if plan.revenue_calculation_mode != cycle.revenue_calculation_mode_used {
            tracing::warn!(
                organization_id = %organization_id,
                cycle_id = %cycle_id,
                snapshot_mode = %cycle.revenue_calculation_mode_used,
                live_mode = %plan.revenue_calculation_mode,
                "calculation mode changed mid-cycle; closing with snapshot mode"
            );
        }

        let metrics = self.metrics_for(&cycle).await?;
        let closure = RevenueCycleLifecycle::plan_close(
            &cycle,
            &plan,
            metrics,
            self.default_closing_day,
            Utc::now(),
        )?;

        let closed = self
            .store
            .close_cycle(organization_id, cycle_id, closure)
            .await?;

        tracing::info!(
            organization_id = %organization_id,
            cycle_id = %cycle_id,
            total_students = closed.total_students,
            sairex_revenue = %closed.sairex_revenue,
            "revenue cycle closed"
        );

        Ok(closed)
    }

    /// Record a signed adjustment on a closed cycle.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAdjustment`, `InvalidAdjustmentAmount`, `EmptyAdjustmentReason`, `CycleNotFound`,
    /// or `CycleNotClosed`.
    pub async fn apply_adjustment(
        &self,
        input: AdjustmentInput,
    ) -> Result<AdjustmentOutcome, RevenueCycleError> {
        RevenueCycleLifecycle::validate_adjustment(input.amount, &input.reason)?;

        let organization_id = input.organization_id;
        let outcome = self.store.apply_adjustment(input).await?;

        tracing::info!(
            organization_id = %organization_id,
            cycle_id = %outcome.cycle.id,
            adjustment_id = %outcome.adjustment.id,
            amount = %outcome.adjustment.amount,
            sairex_revenue = %outcome.cycle.sairex_revenue,
            "revenue adjustment applied"
        );

        Ok(outcome)
    }

    /// Fetch one cycle.
    ///
    /// # Errors
    ///
    /// Returns `CycleNotFound` if absent or in another organization.
    pub async fn get_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<RevenueCycle, RevenueCycleError> {
        self.store
            .find_cycle(organization_id, cycle_id)
            .await?
            .ok_or(RevenueCycleError::CycleNotFound(cycle_id))
    }

    /// Cycle for a month, if one exists.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn find_cycle_for_period(
        &self,
        organization_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        self.store
            .find_cycle_for_period(organization_id, month, year)
            .await
    }

    /// List an organization's cycles, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_cycles(
        &self,
        organization_id: Uuid,
    ) -> Result<Vec<RevenueCycle>, RevenueCycleError> {
        self.store.list_cycles(organization_id).await
    }

    /// List adjustments on a cycle.
    ///
    /// # Errors
    ///
    /// Returns `CycleNotFound` if the cycle is absent or in another organization.
    pub async fn list_adjustments(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Vec<RevenueAdjustment>, RevenueCycleError> {
        self.get_cycle(organization_id, cycle_id).await?;
        self.store.list_adjustments(organization_id, cycle_id).await
    }
}
