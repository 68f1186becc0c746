//! Property-based tests for student balance arithmetic.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::LedgerTotals;
use super::types::{EntryDirection, LedgerEntryType, NewLedgerEntry, StudentFinancialSummary};

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn direction() -> impl Strategy<Value = EntryDirection> {
    prop_oneof![Just(EntryDirection::Debit), Just(EntryDirection::Credit)]
}

fn make_entry(student_id: Uuid, direction: EntryDirection, amount: Decimal) -> NewLedgerEntry {
    NewLedgerEntry {
        id: Uuid::new_v4(),
        organization_id: Uuid::nil(),
        campus_id: Uuid::nil(),
        student_id,
        challan_id: None,
        entry_type: match direction {
            EntryDirection::Debit => LedgerEntryType::ChallanCreated,
            EntryDirection::Credit => LedgerEntryType::PaymentReceived,
        },
        direction,
        amount,
        reference_id: None,
        reference_type: None,
        entry_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        description: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* sequence of entries, the incrementally maintained summary
    /// SHALL equal the debit and credit totals folded from the entries.
    #[test]
    fn prop_summary_matches_folded_entries(
        moves in prop::collection::vec((direction(), positive_amount()), 0..40),
    ) {
        let student_id = Uuid::new_v4();
        let mut summary = StudentFinancialSummary::empty(Uuid::nil(), student_id);
        let mut persisted = Vec::with_capacity(moves.len());

        for (direction, amount) in moves {
            let entry = make_entry(student_id, direction, amount);
            summary.apply(&entry).unwrap();
            persisted.push(entry.into_entry(Utc::now()));
        }

        let totals = LedgerTotals::from_entries(&persisted);
        prop_assert!(summary.is_consistent());
        prop_assert_eq!(summary.total_debit, totals.debit);
        prop_assert_eq!(summary.total_credit, totals.credit);
        prop_assert_eq!(summary.balance, totals.balance());
    }

    /// *For any* rejected entry, the summary SHALL be left unchanged.
    #[test]
    fn prop_rejected_entry_leaves_summary_untouched(
        seed in positive_amount(),
        bad in (-1_000_000i64..=0i64).prop_map(|c| Decimal::new(c, 2)),
    ) {
        let student_id = Uuid::new_v4();
        let mut summary = StudentFinancialSummary::empty(Uuid::nil(), student_id);
        summary.apply(&make_entry(student_id, EntryDirection::Debit, seed)).unwrap();
        let before = summary.clone();

        prop_assert!(summary.apply(&make_entry(student_id, EntryDirection::Credit, bad)).is_err());
        prop_assert_eq!(summary, before);
    }
}
