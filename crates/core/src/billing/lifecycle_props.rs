//! Property-based tests for challan status monotonicity.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::ChallanStatus;

fn order(status: ChallanStatus) -> u8 {
    match status {
        ChallanStatus::Unpaid => 0,
        ChallanStatus::PartiallyPaid => 1,
        ChallanStatus::Paid => 2,
        ChallanStatus::Cancelled => 3,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// *For any* sequence of payments that never overpays, the observed
    /// status sequence SHALL be non-decreasing and every step allowed.
    #[test]
    fn prop_status_never_regresses(
        total_cents in 100i64..10_000_000i64,
        payments in prop::collection::vec(1i64..5_000_000i64, 1..20),
    ) {
        let total = Decimal::new(total_cents, 2);
        let mut paid = Decimal::ZERO;
        let mut status = ChallanStatus::Unpaid;

        for cents in payments {
            let remaining = total - paid;
            if remaining <= Decimal::ZERO {
                break;
            }
            let amount = Decimal::new(cents, 2).min(remaining);
            paid += amount;

            let next = ChallanStatus::for_amounts(paid, total);
            prop_assert!(order(next) >= order(status));
            prop_assert!(status.can_transition_to(next), "{} -> {}", status, next);
            status = next;
        }

        prop_assert!(paid <= total);
    }

    /// *For any* amounts, status SHALL be a pure function of paid vs total.
    #[test]
    fn prop_status_matches_amounts(
        total_cents in 1i64..10_000_000i64,
        paid_cents in 0i64..10_000_000i64,
    ) {
        let total = Decimal::new(total_cents, 2);
        let paid = Decimal::new(paid_cents, 2).min(total);
        let status = ChallanStatus::for_amounts(paid, total);

        match status {
            ChallanStatus::Unpaid => prop_assert_eq!(paid, Decimal::ZERO),
            ChallanStatus::PartiallyPaid => prop_assert!(paid > Decimal::ZERO && paid < total),
            ChallanStatus::Paid => prop_assert_eq!(paid, total),
            ChallanStatus::Cancelled => prop_assert!(false, "never derived from amounts"),
        }
    }
}
