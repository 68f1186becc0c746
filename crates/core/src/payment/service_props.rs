//! Property-based tests for reconciliation against the in-memory store.

use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::ReconciliationService;
use super::types::ReconcilePaymentInput;
use crate::billing::{BillingError, ChallanStatus, FeeChallan};
use crate::ledger::{LedgerService, LedgerTotals};
use crate::testing::InMemoryStore;

fn input(challan: &FeeChallan, amount: Decimal, reference: String) -> ReconcilePaymentInput {
    ReconcilePaymentInput {
        organization_id: challan.organization_id,
        challan_id: challan.id,
        amount,
        payment_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
        paid_at: None,
        payment_channel: "BANK".into(),
        reference_number: reference,
        currency: None,
        gateway: None,
        notes: None,
        recorded_by: None,
    }
}

/// What one run observed, checked outside the runtime.
struct Observed {
    statuses: Vec<ChallanStatus>,
    paid: Decimal,
    total: Decimal,
    balance: Decimal,
    verified: bool,
    debit: Decimal,
    credit: Decimal,
    duplicate_changed_state: bool,
}

fn run(total: Decimal, attempts: Vec<(i64, bool)>) -> Observed {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    runtime.block_on(async move {
        let store = Arc::new(InMemoryStore::new());
        let challan = store.seed_posted_challan(total);
        let service = ReconciliationService::new(Arc::clone(&store), "PKR");

        let mut statuses = vec![ChallanStatus::Unpaid];
        let mut duplicate_changed_state = false;

        for (i, (cents, resubmit)) in attempts.into_iter().enumerate() {
            let payment = input(&challan, Decimal::new(cents, 2), format!("TX-{i}"));
            match service.reconcile(payment.clone()).await {
                Ok(result) => statuses.push(result.challan_status),
                Err(BillingError::Overpayment { .. } | BillingError::ChallanAlreadyPaid(_)) => {}
                Err(err) => panic!("unexpected error: {err}"),
            }

            if resubmit {
                let entries = store.ledger_entry_count();
                let paid = store.challan(challan.id).paid_amount;
                let outcome = service.reconcile(payment).await;
                let rejected = matches!(
                    outcome,
                    Err(BillingError::DuplicatePayment { .. }
                        | BillingError::Overpayment { .. }
                        | BillingError::ChallanAlreadyPaid(_))
                );
                if !rejected
                    || store.ledger_entry_count() != entries
                    || store.challan(challan.id).paid_amount != paid
                {
                    duplicate_changed_state = true;
                }
            }
        }

        let statement = LedgerService::load_statement(
            store.as_ref(),
            challan.organization_id,
            challan.student_id,
        )
        .await
        .unwrap();
        let totals = LedgerTotals::from_entries(&statement.entries);

        Observed {
            statuses,
            paid: store.challan(challan.id).paid_amount,
            total,
            balance: statement.summary.balance,
            verified: statement.verified,
            debit: totals.debit,
            credit: totals.credit,
            duplicate_changed_state,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// *For any* payment sequence, the challan SHALL never be overpaid, its
    /// status SHALL never regress, and the summary SHALL equal the ledger.
    #[test]
    fn prop_reconciliation_preserves_invariants(
        total_cents in 100i64..1_000_000i64,
        attempts in prop::collection::vec((1i64..600_000i64, any::<bool>()), 1..12),
    ) {
        let total = Decimal::new(total_cents, 2);
        let observed = run(total, attempts);

        prop_assert!(observed.paid <= observed.total);
        prop_assert!(observed.verified);
        prop_assert_eq!(observed.balance, observed.debit - observed.credit);
        prop_assert_eq!(observed.debit, observed.total);
        prop_assert_eq!(observed.credit, observed.paid);
        prop_assert!(!observed.duplicate_changed_state);

        for pair in observed.statuses.windows(2) {
            prop_assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }
}
