//! Revenue cycle domain types.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the platform counts billable students for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueCalculationMode {
    /// Students with a challan issued in the month.
    OnGeneratedFee,
    /// Students with a reconciled payment in the month.
    OnCollectedFee,
}

impl RevenueCalculationMode {
    /// Returns the stored name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OnGeneratedFee => "ON_GENERATED_FEE",
            Self::OnCollectedFee => "ON_COLLECTED_FEE",
        }
    }
}

impl fmt::Display for RevenueCalculationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of a revenue cycle.
///
/// Valid transitions:
/// - Open → Closed (close, exactly once)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueCycleStatus {
    /// Metrics still refresh.
    Open,
    /// Terms and revenue frozen; only adjustments apply.
    Closed,
}

impl RevenueCycleStatus {
    /// Returns the stored name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

/// An organization's live commercial terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingPlan {
    /// Organization.
    pub organization_id: Uuid,
    /// Student counting mode.
    pub revenue_calculation_mode: RevenueCalculationMode,
    /// Platform fee per billable student.
    pub per_student_fee: Decimal,
    /// Day of month the previous cycle closes; `None` uses the default.
    pub closing_day: Option<i32>,
}

impl BillingPlan {
    /// Closing day if within 1..=28, otherwise `default_day`.
    #[must_use]
    pub fn effective_closing_day(&self, default_day: u32) -> u32 {
        effective_closing_day(self.closing_day, default_day)
    }
}

/// Closing day if within 1..=28, otherwise `default_day`.
#[must_use]
pub fn effective_closing_day(closing_day: Option<i32>, default_day: u32) -> u32 {
    closing_day
        .and_then(|day| u32::try_from(day).ok())
        .filter(|day| (1..=28).contains(day))
        .unwrap_or(default_day)
}

/// Metrics computed over a cycle's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RevenueCycleMetrics {
    /// Distinct billable students for the cycle's mode.
    pub total_students: i64,
    /// Sum of non-cancelled challan totals issued in the month.
    pub generated_amount: Decimal,
    /// Sum of reconciled payments paid in the month.
    pub collected_amount: Decimal,
}

/// Half-open UTC interval `[start, end)` covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    /// First instant of the month.
    pub start: DateTime<Utc>,
    /// First instant of the following month.
    pub end: DateTime<Utc>,
}

impl CycleWindow {
    /// Returns true if `ts` falls in the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Returns true if `date` falls in the window.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start.date_naive() && date < self.end.date_naive()
    }
}

/// One organization's platform billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueCycle {
    /// Cycle ID.
    pub id: Uuid,
    /// Organization.
    pub organization_id: Uuid,
    /// Month (1-12).
    pub month: u32,
    /// Year.
    pub year: i32,
    /// Mode snapshotted at creation.
    pub revenue_calculation_mode_used: RevenueCalculationMode,
    /// Fee snapshotted at creation, re-snapshotted at close.
    pub per_student_fee_used: Decimal,
    /// Closing day snapshotted at creation, re-snapshotted at close.
    pub closing_day_used: u32,
    /// Billable students.
    pub total_students: i64,
    /// Challan totals issued in the month.
    pub generated_amount: Decimal,
    /// Payments collected in the month.
    pub collected_amount: Decimal,
    /// Platform revenue (projected while open, final once closed).
    pub sairex_revenue: Decimal,
    /// Lifecycle state.
    pub status: RevenueCycleStatus,
    /// When the cycle closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last metrics refresh or state change.
    pub updated_at: DateTime<Utc>,
}

impl RevenueCycle {
    /// Returns true if the cycle is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == RevenueCycleStatus::Closed
    }
}

/// A freshly snapshotted cycle about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRevenueCycle {
    /// Pre-assigned cycle ID.
    pub id: Uuid,
    /// Organization.
    pub organization_id: Uuid,
    /// Month (1-12).
    pub month: u32,
    /// Year.
    pub year: i32,
    /// Snapshotted mode.
    pub revenue_calculation_mode_used: RevenueCalculationMode,
    /// Snapshotted fee.
    pub per_student_fee_used: Decimal,
    /// Snapshotted closing day.
    pub closing_day_used: u32,
}

impl NewRevenueCycle {
    /// Converts the pending cycle into its persisted, open form.
    #[must_use]
    pub fn into_cycle(self, now: DateTime<Utc>) -> RevenueCycle {
        RevenueCycle {
            id: self.id,
            organization_id: self.organization_id,
            month: self.month,
            year: self.year,
            revenue_calculation_mode_used: self.revenue_calculation_mode_used,
            per_student_fee_used: self.per_student_fee_used,
            closing_day_used: self.closing_day_used,
            total_students: 0,
            generated_amount: Decimal::ZERO,
            collected_amount: Decimal::ZERO,
            sairex_revenue: Decimal::ZERO,
            status: RevenueCycleStatus::Open,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Outcome of inserting a cycle.
#[derive(Debug, Clone)]
pub enum CycleInsert {
    /// Row was inserted.
    Created(RevenueCycle),
    /// A cycle for the same organization and month already existed.
    AlreadyExists(RevenueCycle),
}

/// Result of an idempotent cycle creation.
#[derive(Debug, Clone, Serialize)]
pub struct CycleCreation {
    /// The new or existing cycle.
    pub cycle: RevenueCycle,
    /// False when the cycle already existed.
    pub created: bool,
}

/// Values written when a cycle closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleClosure {
    /// Live fee at close time.
    pub per_student_fee_used: Decimal,
    /// Live closing day at close time.
    pub closing_day_used: u32,
    /// Final metrics.
    pub metrics: RevenueCycleMetrics,
    /// `total_students × per_student_fee_used`.
    pub sairex_revenue: Decimal,
    /// Close timestamp.
    pub closed_at: DateTime<Utc>,
}

/// Metrics computed for a cycle and whether they were stored.
#[derive(Debug, Clone, Serialize)]
pub struct LiveMetrics {
    /// Cycle after the refresh.
    pub cycle: RevenueCycle,
    /// Computed metrics.
    pub metrics: RevenueCycleMetrics,
    /// False for closed cycles, which are never mutated.
    pub persisted: bool,
}

/// An audit record correcting a closed cycle's revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueAdjustment {
    /// Adjustment ID.
    pub id: Uuid,
    /// Organization.
    pub organization_id: Uuid,
    /// Adjusted cycle.
    pub revenue_cycle_id: Uuid,
    /// Signed amount added to `sairex_revenue`.
    pub amount: Decimal,
    /// Why the adjustment was made.
    pub reason: String,
    /// Principal that made it.
    pub created_by: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for adjusting a closed cycle.
#[derive(Debug, Clone)]
pub struct AdjustmentInput {
    /// Organization.
    pub organization_id: Uuid,
    /// Cycle to adjust.
    pub revenue_cycle_id: Uuid,
    /// Signed, non-zero amount.
    pub amount: Decimal,
    /// Non-empty reason.
    pub reason: String,
    /// Principal making the adjustment.
    pub created_by: Uuid,
}

/// Committed adjustment and the cycle it changed.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    /// Inserted audit record.
    pub adjustment: RevenueAdjustment,
    /// Cycle with the incremented revenue.
    pub cycle: RevenueCycle,
}
