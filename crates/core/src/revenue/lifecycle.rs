//! Revenue cycle state machine: Open → Closed, then adjustments only.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::RevenueCycleError;
use super::types::{
    AdjustmentInput, BillingPlan, CycleClosure, CycleWindow, NewRevenueCycle, RevenueAdjustment,
    RevenueCycle, RevenueCycleMetrics, RevenueCycleStatus,
};
use crate::money;

/// Stateless revenue cycle transitions.
pub struct RevenueCycleLifecycle;

impl RevenueCycleLifecycle {
    /// Validates a month/year pair.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth` or `InvalidYear`.
    pub fn validate_period(month: u32, year: i32) -> Result<(), RevenueCycleError> {
        if !(1..=12).contains(&month) {
            return Err(RevenueCycleError::InvalidMonth(month));
        }
        if !(2000..=9999).contains(&year) {
            return Err(RevenueCycleError::InvalidYear(year));
        }
        Ok(())
    }

    /// UTC window `[first of month, first of next month)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth` or `InvalidYear`.
    pub fn period_window(month: u32, year: i32) -> Result<CycleWindow, RevenueCycleError> {
        Self::validate_period(month, year)?;
        let (next_month, next_year) = Self::next_period(month, year);

        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(RevenueCycleError::InvalidMonth(month))?
            .and_utc();
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(RevenueCycleError::InvalidYear(next_year))?
            .and_utc();

        Ok(CycleWindow { start, end })
    }

    /// Month before `(month, year)`.
    #[must_use]
    pub const fn previous_period(month: u32, year: i32) -> (u32, i32) {
        if month <= 1 { (12, year - 1) } else { (month - 1, year) }
    }

    /// Month after `(month, year)`.
    #[must_use]
    pub const fn next_period(month: u32, year: i32) -> (u32, i32) {
        if month >= 12 { (1, year + 1) } else { (month + 1, year) }
    }

    /// Platform revenue for a student count.
    #[must_use]
    pub fn revenue_for(total_students: i64, per_student_fee: Decimal) -> Decimal {
        Decimal::from(total_students) * per_student_fee
    }

    /// Snapshots the live plan into a new open cycle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMonth` or `InvalidYear`.
    pub fn snapshot(
        plan: &BillingPlan,
        month: u32,
        year: i32,
        default_closing_day: u32,
    ) -> Result<NewRevenueCycle, RevenueCycleError> {
        Self::validate_period(month, year)?;
        Ok(NewRevenueCycle {
            id: Uuid::now_v7(),
            organization_id: plan.organization_id,
            month,
            year,
            revenue_calculation_mode_used: plan.revenue_calculation_mode,
            per_student_fee_used: plan.per_student_fee,
            closing_day_used: plan.effective_closing_day(default_closing_day),
        })
    }

    /// Errors unless the cycle is open.
    ///
    /// # Errors
    ///
    /// Returns `CycleAlreadyClosed`.
    pub fn ensure_open(cycle: &RevenueCycle) -> Result<(), RevenueCycleError> {
        match cycle.status {
            RevenueCycleStatus::Open => Ok(()),
            RevenueCycleStatus::Closed => Err(RevenueCycleError::CycleAlreadyClosed(cycle.id)),
        }
    }

    /// Errors unless the cycle is closed.
    ///
    /// # Errors
    ///
    /// Returns `CycleNotClosed`.
    pub fn ensure_closed(cycle: &RevenueCycle) -> Result<(), RevenueCycleError> {
        match cycle.status {
            RevenueCycleStatus::Closed => Ok(()),
            RevenueCycleStatus::Open => Err(RevenueCycleError::CycleNotClosed(cycle.id)),
        }
    }

    /// Applies refreshed metrics to an open cycle.
    ///
    /// # Errors
    ///
    /// Returns `CycleAlreadyClosed` for closed cycles, which are never mutated.
    pub fn refresh(
        cycle: &RevenueCycle,
        metrics: RevenueCycleMetrics,
        now: DateTime<Utc>,
    ) -> Result<RevenueCycle, RevenueCycleError> {
        Self::ensure_open(cycle)?;
        let mut refreshed = cycle.clone();
        refreshed.total_students = metrics.total_students;
        refreshed.generated_amount = metrics.generated_amount;
        refreshed.collected_amount = metrics.collected_amount;
        refreshed.sairex_revenue =
            Self::revenue_for(metrics.total_students, cycle.per_student_fee_used);
        refreshed.updated_at = now;
        Ok(refreshed)
    }

    /// Plans the close of an open cycle against the latest plan terms.
    ///
    /// The fee and closing day are re-read from `plan`; the counting mode
    /// stays the one snapshotted at creation.
    ///
    /// # Errors
    ///
    /// Returns `CycleAlreadyClosed`.
    pub fn plan_close(
        cycle: &RevenueCycle,
        plan: &BillingPlan,
        metrics: RevenueCycleMetrics,
        default_closing_day: u32,
        now: DateTime<Utc>,
    ) -> Result<CycleClosure, RevenueCycleError> {
        Self::ensure_open(cycle)?;
        Ok(CycleClosure {
            per_student_fee_used: plan.per_student_fee,
            closing_day_used: plan.effective_closing_day(default_closing_day),
            metrics,
            sairex_revenue: Self::revenue_for(metrics.total_students, plan.per_student_fee),
            closed_at: now,
        })
    }

    /// Applies a close plan to an open cycle.
    ///
    /// # Errors
    ///
    /// Returns `CycleAlreadyClosed`.
    pub fn apply_close(
        cycle: &RevenueCycle,
        closure: &CycleClosure,
    ) -> Result<RevenueCycle, RevenueCycleError> {
        Self::ensure_open(cycle)?;
        let mut closed = cycle.clone();
        closed.per_student_fee_used = closure.per_student_fee_used;
        closed.closing_day_used = closure.closing_day_used;
        closed.total_students = closure.metrics.total_students;
        closed.generated_amount = closure.metrics.generated_amount;
        closed.collected_amount = closure.metrics.collected_amount;
        closed.sairex_revenue = closure.sairex_revenue;
        closed.status = RevenueCycleStatus::Closed;
        closed.closed_at = Some(closure.closed_at);
        closed.updated_at = closure.closed_at;
        Ok(closed)
    }

    /// Validates adjustment input before any lookup.
    ///
    /// # Errors
    ///
    /// Returns `ZeroAdjustment`, `InvalidAdjustmentAmount`, or `EmptyAdjustmentReason`.
    pub fn validate_adjustment(amount: Decimal, reason: &str) -> Result<(), RevenueCycleError> {
        if amount.is_zero() {
            return Err(RevenueCycleError::ZeroAdjustment);
        }
        if !money::fits_storage(amount) {
            return Err(RevenueCycleError::InvalidAdjustmentAmount(amount));
        }
        if reason.trim().is_empty() {
            return Err(RevenueCycleError::EmptyAdjustmentReason);
        }
        Ok(())
    }

    /// Plans an adjustment against a locked, closed cycle.
    ///
    /// # Errors
    ///
    /// Returns `CycleNotClosed` or a validation error.
    pub fn plan_adjustment(
        cycle: &RevenueCycle,
        input: &AdjustmentInput,
        now: DateTime<Utc>,
    ) -> Result<(RevenueAdjustment, RevenueCycle), RevenueCycleError> {
        Self::validate_adjustment(input.amount, &input.reason)?;
        Self::ensure_closed(cycle)?;

        let adjustment = RevenueAdjustment {
            id: Uuid::now_v7(),
            organization_id: cycle.organization_id,
            revenue_cycle_id: cycle.id,
            amount: input.amount,
            reason: input.reason.trim().to_string(),
            created_by: input.created_by,
            created_at: now,
        };

        let mut adjusted = cycle.clone();
        adjusted.sairex_revenue += input.amount;
        adjusted.updated_at = now;
        Ok((adjustment, adjusted))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::revenue::types::RevenueCalculationMode;

    fn plan(fee: Decimal, closing_day: Option<i32>) -> BillingPlan {
        BillingPlan {
            organization_id: Uuid::new_v4(),
            revenue_calculation_mode: RevenueCalculationMode::OnGeneratedFee,
            per_student_fee: fee,
            closing_day,
        }
    }

    fn open_cycle(fee: Decimal) -> RevenueCycle {
        RevenueCycleLifecycle::snapshot(&plan(fee, Some(10)), 3, 2026, 10)
            .unwrap()
            .into_cycle(Utc::now())
    }

    #[test]
    fn test_period_window_spans_month() {
        let window = RevenueCycleLifecycle::period_window(12, 2025).unwrap();
        assert_eq!(window.start.to_rfc3339(), "2025-12-01T00:00:00+00:00");
        assert_eq!(window.end.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert!(window.contains_date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!window.contains_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }

    #[rstest]
    #[case(1, 2026, (12, 2025))]
    #[case(7, 2026, (6, 2026))]
    fn test_previous_period(#[case] month: u32, #[case] year: i32, #[case] expected: (u32, i32)) {
        assert_eq!(RevenueCycleLifecycle::previous_period(month, year), expected);
    }

    #[rstest]
    #[case(0, 2026, "INVALID_MONTH")]
    #[case(13, 2026, "INVALID_MONTH")]
    #[case(5, 1999, "INVALID_YEAR")]
    fn test_invalid_period(#[case] month: u32, #[case] year: i32, #[case] code: &str) {
        let err = RevenueCycleLifecycle::validate_period(month, year).unwrap_err();
        assert_eq!(err.error_code(), code);
    }

    #[rstest]
    #[case(Some(5), 5)]
    #[case(Some(28), 28)]
    #[case(Some(29), 10)]
    #[case(Some(0), 10)]
    #[case(Some(-3), 10)]
    #[case(None, 10)]
    fn test_effective_closing_day(#[case] configured: Option<i32>, #[case] expected: u32) {
        assert_eq!(plan(dec!(1), configured).effective_closing_day(10), expected);
    }

    #[test]
    fn test_refresh_projects_revenue() {
        let cycle = open_cycle(dec!(150));
        let metrics = RevenueCycleMetrics {
            total_students: 40,
            generated_amount: dec!(120000),
            collected_amount: dec!(80000),
        };

        let refreshed = RevenueCycleLifecycle::refresh(&cycle, metrics, Utc::now()).unwrap();
        assert_eq!(refreshed.sairex_revenue, dec!(6000));
        assert_eq!(refreshed.status, RevenueCycleStatus::Open);
    }

    #[test]
    fn test_close_uses_latest_fee() {
        let cycle = open_cycle(dec!(150));
        let live = plan(dec!(200), Some(5));
        let metrics = RevenueCycleMetrics {
            total_students: 10,
            ..RevenueCycleMetrics::default()
        };

        let closure =
            RevenueCycleLifecycle::plan_close(&cycle, &live, metrics, 10, Utc::now()).unwrap();
        let closed = RevenueCycleLifecycle::apply_close(&cycle, &closure).unwrap();

        assert_eq!(closed.per_student_fee_used, dec!(200));
        assert_eq!(closed.closing_day_used, 5);
        assert_eq!(closed.sairex_revenue, dec!(2000));
        assert!(closed.is_closed());
        assert!(closed.closed_at.is_some());
    }

    #[test]
    fn test_closed_cycle_cannot_close_or_refresh() {
        let cycle = open_cycle(dec!(150));
        let closure = RevenueCycleLifecycle::plan_close(
            &cycle,
            &plan(dec!(150), None),
            RevenueCycleMetrics::default(),
            10,
            Utc::now(),
        )
        .unwrap();
        let closed = RevenueCycleLifecycle::apply_close(&cycle, &closure).unwrap();

        assert_eq!(
            RevenueCycleLifecycle::apply_close(&closed, &closure).unwrap_err().error_code(),
            "CYCLE_ALREADY_CLOSED"
        );
        assert!(RevenueCycleLifecycle::refresh(&closed, RevenueCycleMetrics::default(), Utc::now()).is_err());
    }

    #[test]
    fn test_adjustment_requires_closed_cycle() {
        let cycle = open_cycle(dec!(150));
        let input = AdjustmentInput {
            organization_id: cycle.organization_id,
            revenue_cycle_id: cycle.id,
            amount: dec!(-50),
            reason: "late withdrawal".into(),
            created_by: Uuid::new_v4(),
        };

        let err = RevenueCycleLifecycle::plan_adjustment(&cycle, &input, Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "CYCLE_NOT_CLOSED");
    }

    #[rstest]
    #[case(dec!(0), "reason", "ZERO_ADJUSTMENT")]
    #[case(dec!(10), "  ", "EMPTY_ADJUSTMENT_REASON")]
    #[case(dec!(-0.00001), "rounding", "INVALID_AMOUNT")]
    #[case(dec!(50.12345), "rounding", "INVALID_AMOUNT")]
    fn test_adjustment_validation(
        #[case] amount: Decimal,
        #[case] reason: &str,
        #[case] code: &str,
    ) {
        let err = RevenueCycleLifecycle::validate_adjustment(amount, reason).unwrap_err();
        assert_eq!(err.error_code(), code);
    }
}
