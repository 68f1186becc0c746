//! Challan status lifecycle.
//!
//! Status is a pure function of `paid_amount` against `total_amount` for
//! every non-cancelled challan, and collection statuses only move forward.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::error::BillingError;
use super::types::{ChallanStatus, FeeChallan};
use crate::ledger::{LedgerService, NewLedgerEntry};

impl ChallanStatus {
    /// Status implied by the collected amount.
    #[must_use]
    pub fn for_amounts(paid_amount: Decimal, total_amount: Decimal) -> Self {
        if paid_amount <= Decimal::ZERO {
            Self::Unpaid
        } else if paid_amount >= total_amount {
            Self::Paid
        } else {
            Self::PartiallyPaid
        }
    }

    /// Position in the collection order.
    const fn rank(self) -> u8 {
        match self {
            Self::Unpaid => 0,
            Self::PartiallyPaid => 1,
            Self::Paid => 2,
            Self::Cancelled => 3,
        }
    }

    /// Returns true if the status accepts no further changes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Returns true if moving from `self` to `next` is allowed.
    ///
    /// Staying on `PartiallyPaid` is allowed so several partial payments
    /// can land in a row.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Unpaid, Self::Cancelled) => true,
            (_, Self::Cancelled) | (Self::Cancelled | Self::Paid, _) => false,
            (Self::PartiallyPaid, Self::PartiallyPaid) => true,
            (from, to) => to.rank() > from.rank(),
        }
    }
}

/// Cancellation about to be written: the updated challan and its waiver.
#[derive(Debug, Clone)]
pub struct CancellationPlan {
    /// Challan with status, timestamp, and reason applied.
    pub challan: FeeChallan,
    /// Credit that removes the challan amount from the student balance.
    pub waiver: NewLedgerEntry,
}

/// Stateless challan transition checks.
pub struct ChallanLifecycle;

impl ChallanLifecycle {
    /// Validates a status change.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidStatusTransition` if the move regresses
    /// or leaves a terminal status.
    pub fn ensure_transition(from: ChallanStatus, to: ChallanStatus) -> Result<(), BillingError> {
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(BillingError::InvalidStatusTransition { from, to })
        }
    }

    /// Plans the cancellation of a challan that has collected nothing.
    ///
    /// # Errors
    ///
    /// - `BillingError::MissingField` if the reason is blank
    /// - `BillingError::CannotCancelPaidChallan` if money was collected
    /// - `BillingError::InvalidStatusTransition` if already cancelled
    pub fn plan_cancellation(
        challan: &FeeChallan,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<CancellationPlan, BillingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BillingError::MissingField("reason"));
        }
        if challan.paid_amount > Decimal::ZERO
            || matches!(challan.status, ChallanStatus::PartiallyPaid | ChallanStatus::Paid)
        {
            return Err(BillingError::CannotCancelPaidChallan(challan.id));
        }
        Self::ensure_transition(challan.status, ChallanStatus::Cancelled)?;

        let mut cancelled = challan.clone();
        cancelled.status = ChallanStatus::Cancelled;
        cancelled.cancelled_at = Some(now);
        cancelled.cancellation_reason = Some(reason.to_string());

        let waiver = LedgerService::cancellation_waiver(challan, now.date_naive(), reason);
        Ok(CancellationPlan {
            challan: cancelled,
            waiver,
        })
    }

    /// Rejects payments against challans that cannot collect.
    ///
    /// # Errors
    ///
    /// Returns `ChallanAlreadyPaid` or `ChallanCancelled`.
    pub fn ensure_collectable(challan: &FeeChallan) -> Result<(), BillingError> {
        match challan.status {
            ChallanStatus::Paid => Err(BillingError::ChallanAlreadyPaid(challan.id)),
            ChallanStatus::Cancelled => Err(BillingError::ChallanCancelled(challan.id)),
            ChallanStatus::Unpaid | ChallanStatus::PartiallyPaid => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::{EntryDirection, LedgerEntryType};
    use crate::testing::sample_challan;

    #[rstest]
    #[case(dec!(0), dec!(1000), ChallanStatus::Unpaid)]
    #[case(dec!(400), dec!(1000), ChallanStatus::PartiallyPaid)]
    #[case(dec!(999.99), dec!(1000), ChallanStatus::PartiallyPaid)]
    #[case(dec!(1000), dec!(1000), ChallanStatus::Paid)]
    fn test_status_for_amounts(
        #[case] paid: Decimal,
        #[case] total: Decimal,
        #[case] expected: ChallanStatus,
    ) {
        assert_eq!(ChallanStatus::for_amounts(paid, total), expected);
    }

    #[rstest]
    #[case(ChallanStatus::Unpaid, ChallanStatus::PartiallyPaid, true)]
    #[case(ChallanStatus::Unpaid, ChallanStatus::Paid, true)]
    #[case(ChallanStatus::Unpaid, ChallanStatus::Cancelled, true)]
    #[case(ChallanStatus::PartiallyPaid, ChallanStatus::PartiallyPaid, true)]
    #[case(ChallanStatus::PartiallyPaid, ChallanStatus::Paid, true)]
    #[case(ChallanStatus::PartiallyPaid, ChallanStatus::Unpaid, false)]
    #[case(ChallanStatus::PartiallyPaid, ChallanStatus::Cancelled, false)]
    #[case(ChallanStatus::Paid, ChallanStatus::PartiallyPaid, false)]
    #[case(ChallanStatus::Paid, ChallanStatus::Cancelled, false)]
    #[case(ChallanStatus::Cancelled, ChallanStatus::Unpaid, false)]
    #[case(ChallanStatus::Cancelled, ChallanStatus::Cancelled, false)]
    fn test_transitions(
        #[case] from: ChallanStatus,
        #[case] to: ChallanStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_plan_cancellation_adds_waiver() {
        let challan = sample_challan(dec!(2500));
        let now = Utc::now();

        let plan = ChallanLifecycle::plan_cancellation(&challan, " duplicate student ", now).unwrap();

        assert_eq!(plan.challan.status, ChallanStatus::Cancelled);
        assert_eq!(plan.challan.cancelled_at, Some(now));
        assert_eq!(plan.challan.cancellation_reason.as_deref(), Some("duplicate student"));
        assert_eq!(plan.waiver.entry_type, LedgerEntryType::Waiver);
        assert_eq!(plan.waiver.direction, EntryDirection::Credit);
        assert_eq!(plan.waiver.amount, dec!(2500));
    }

    #[test]
    fn test_cannot_cancel_partially_paid() {
        let mut challan = sample_challan(dec!(2500));
        challan.paid_amount = dec!(100);
        challan.status = ChallanStatus::PartiallyPaid;

        let err = ChallanLifecycle::plan_cancellation(&challan, "mistake", Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_CANCEL_PAID_CHALLAN");
    }

    #[test]
    fn test_cannot_cancel_twice() {
        let mut challan = sample_challan(dec!(2500));
        challan.status = ChallanStatus::Cancelled;

        let err = ChallanLifecycle::plan_cancellation(&challan, "again", Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");
    }

    #[test]
    fn test_cancellation_requires_reason() {
        let challan = sample_challan(dec!(2500));
        let err = ChallanLifecycle::plan_cancellation(&challan, "   ", Utc::now()).unwrap_err();
        assert!(matches!(err, BillingError::MissingField("reason")));
    }

    #[test]
    fn test_ensure_collectable() {
        let mut challan = sample_challan(dec!(100));
        assert!(ChallanLifecycle::ensure_collectable(&challan).is_ok());

        challan.status = ChallanStatus::Paid;
        assert_eq!(
            ChallanLifecycle::ensure_collectable(&challan).unwrap_err().error_code(),
            "CHALLAN_ALREADY_PAID"
        );

        challan.status = ChallanStatus::Cancelled;
        assert_eq!(
            ChallanLifecycle::ensure_collectable(&challan).unwrap_err().error_code(),
            "CHALLAN_CANCELLED"
        );
    }
}
