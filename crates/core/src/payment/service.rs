//! Reconciliation service: payment → challan → ledger → summary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::store::PaymentStore;
use super::types::{
    PaymentPlan, PaymentRecord, PaymentStatus, ReconcilePaymentInput, ReconciliationResult,
};
use crate::billing::{BillingError, ChallanLifecycle, ChallanStatus, FeeChallan};
use crate::ledger::LedgerService;
use crate::money;

/// Service for recording payments against challans.
pub struct ReconciliationService<S> {
    store: Arc<S>,
    default_currency: String,
}

impl<S> Clone for ReconciliationService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_currency: self.default_currency.clone(),
        }
    }
}

impl<S> ReconciliationService<S> {
    /// Validate the caller-supplied fields of a payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for non-positive amounts or amounts finer than
    /// the stored scale, and `MissingField` for a blank channel or reference
    /// number.
    pub fn validate(input: &ReconcilePaymentInput) -> Result<(), BillingError> {
        if input.amount <= Decimal::ZERO || !money::fits_storage(input.amount) {
            return Err(BillingError::InvalidAmount(input.amount));
        }
        if input.payment_channel.trim().is_empty() {
            return Err(BillingError::MissingField("payment_channel"));
        }
        if input.reference_number.trim().is_empty() {
            return Err(BillingError::MissingField("reference_number"));
        }
        Ok(())
    }

    /// Plan the writes for one payment against a locked challan.
    ///
    /// Runs inside the store's transaction, after the natural-key lookup and
    /// before any write. Overpayment is rejected so `paid_amount` never
    /// exceeds `total_amount`.
    ///
    /// # Errors
    ///
    /// - `ChallanNotFound` if the challan is in another organization
    /// - `ChallanAlreadyPaid` / `ChallanCancelled` if it cannot collect
    /// - `DuplicatePayment` if `duplicate` is set
    /// - `Overpayment` if the amount exceeds the remaining balance
    pub fn plan(
        challan: &FeeChallan,
        input: &ReconcilePaymentInput,
        duplicate: bool,
        default_currency: &str,
        now: DateTime<Utc>,
    ) -> Result<PaymentPlan, BillingError> {
        Self::validate(input)?;
        if challan.organization_id != input.organization_id || challan.id != input.challan_id {
            return Err(BillingError::ChallanNotFound(input.challan_id));
        }

        ChallanLifecycle::ensure_collectable(challan)?;

        let key = input.natural_key();
        if duplicate {
            return Err(BillingError::DuplicatePayment {
                challan_id: challan.id,
                reference_number: key.reference_number,
            });
        }

        let remaining = challan.remaining_amount();
        if input.amount > remaining {
            return Err(BillingError::Overpayment {
                amount: input.amount,
                remaining,
            });
        }

        let new_paid = challan.paid_amount + input.amount;
        let new_status = ChallanStatus::for_amounts(new_paid, challan.total_amount);
        ChallanLifecycle::ensure_transition(challan.status, new_status)?;

        let paid_at = input.paid_at.unwrap_or_else(|| {
            input
                .payment_date
                .and_hms_opt(0, 0, 0)
                .map_or(now, |midnight| midnight.and_utc())
        });

        let payment = PaymentRecord {
            id: Uuid::now_v7(),
            organization_id: challan.organization_id,
            challan_id: challan.id,
            amount: input.amount,
            currency: input
                .currency
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(default_currency)
                .to_ascii_uppercase(),
            payment_channel: key.payment_channel,
            gateway: input.gateway.clone(),
            reference_number: key.reference_number,
            payment_date: input.payment_date,
            paid_at,
            status: PaymentStatus::Reconciled,
            notes: input.notes.clone(),
            recorded_by: input.recorded_by,
            created_at: now,
        };

        let credit =
            LedgerService::payment_credit(challan, payment.id, input.amount, input.payment_date);

        let mut updated = challan.clone();
        updated.paid_amount = new_paid;
        updated.status = new_status;

        Ok(PaymentPlan {
            payment,
            challan: updated,
            credit,
        })
    }
}

impl<S: PaymentStore> ReconciliationService<S> {
    /// Create a new reconciliation service.
    #[must_use]
    pub fn new(store: Arc<S>, default_currency: impl Into<String>) -> Self {
        Self {
            store,
            default_currency: default_currency.into(),
        }
    }

    /// Reconcile a payment against a challan.
    ///
    /// All writes commit or roll back together; a rejected submission
    /// leaves the ledger and summary untouched.
    ///
    /// # Errors
    ///
    /// Returns `BillingError` as described on [`Self::plan`], plus store failures.
    pub async fn reconcile(
        &self,
        input: ReconcilePaymentInput,
    ) -> Result<ReconciliationResult, BillingError> {
        Self::validate(&input)?;

        let organization_id = input.organization_id;
        let challan_id = input.challan_id;
        let amount = input.amount;

        match self
            .store
            .reconcile_payment(input, self.default_currency.clone(), Utc::now())
            .await
        {
            Ok(result) => {
                tracing::info!(
                    organization_id = %organization_id,
                    challan_id = %challan_id,
                    payment_record_id = %result.payment_record_id,
                    amount = %amount,
                    status = %result.challan_status,
                    "payment reconciled"
                );
                Ok(result)
            }
            Err(err @ BillingError::DuplicatePayment { .. }) => {
                tracing::warn!(
                    organization_id = %organization_id,
                    challan_id = %challan_id,
                    amount = %amount,
                    "duplicate payment submission rejected"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Payments recorded against a challan.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn payments_for_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, BillingError> {
        self.store
            .payments_for_challan(organization_id, challan_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::ledger::{EntryDirection, LedgerService as Ledger, LedgerTotals};
    use crate::testing::{InMemoryStore, sample_challan};

    fn payment(challan: &FeeChallan, amount: Decimal, reference: &str) -> ReconcilePaymentInput {
        ReconcilePaymentInput {
            organization_id: challan.organization_id,
            challan_id: challan.id,
            amount,
            payment_date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            paid_at: None,
            payment_channel: "bank".to_string(),
            reference_number: reference.to_string(),
            currency: None,
            gateway: None,
            notes: None,
            recorded_by: None,
        }
    }

    #[test]
    fn test_plan_partial_payment() {
        let challan = sample_challan(dec!(1000));
        let plan = ReconciliationService::<InMemoryStore>::plan(
            &challan,
            &payment(&challan, dec!(400), "TX-1"),
            false,
            "PKR",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(plan.challan.status, ChallanStatus::PartiallyPaid);
        assert_eq!(plan.challan.paid_amount, dec!(400));
        assert_eq!(plan.payment.currency, "PKR");
        assert_eq!(plan.payment.payment_channel, "BANK");
        assert_eq!(plan.payment.status, PaymentStatus::Reconciled);
        assert_eq!(plan.credit.direction, EntryDirection::Credit);
        assert_eq!(plan.credit.reference_id, Some(plan.payment.id));
        assert_eq!(plan.result().remaining_amount, dec!(600));
        assert_eq!(
            plan.payment.paid_at.date_naive(),
            NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
        );
    }

    #[test]
    fn test_plan_rejects_overpayment() {
        let challan = sample_challan(dec!(1000));
        let err = ReconciliationService::<InMemoryStore>::plan(
            &challan,
            &payment(&challan, dec!(1000.01), "TX-1"),
            false,
            "PKR",
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, BillingError::Overpayment { remaining, .. } if remaining == dec!(1000)));
    }

    #[test]
    fn test_plan_rejects_other_organization() {
        let challan = sample_challan(dec!(1000));
        let mut input = payment(&challan, dec!(10), "TX-1");
        input.organization_id = Uuid::new_v4();

        let err = ReconciliationService::<InMemoryStore>::plan(&challan, &input, false, "PKR", Utc::now())
            .unwrap_err();
        assert_eq!(err.error_code(), "CHALLAN_NOT_FOUND");
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let challan = sample_challan(dec!(1000));
        let zero = payment(&challan, dec!(0), "TX-1");
        assert_eq!(
            ReconciliationService::<InMemoryStore>::validate(&zero).unwrap_err().error_code(),
            "INVALID_AMOUNT"
        );

        let blank_reference = payment(&challan, dec!(10), "  ");
        assert!(matches!(
            ReconciliationService::<InMemoryStore>::validate(&blank_reference),
            Err(BillingError::MissingField("reference_number"))
        ));
    }

    #[rstest]
    #[case(dec!(0.00001))]
    #[case(dec!(999.99999))]
    #[case(dec!(400.00004))]
    fn test_validate_rejects_amounts_finer_than_storage(#[case] amount: Decimal) {
        let challan = sample_challan(dec!(1000));
        let err = ReconciliationService::<InMemoryStore>::plan(
            &challan,
            &payment(&challan, amount, "TX-1"),
            false,
            "PKR",
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount(a) if a == amount));
    }

    #[tokio::test]
    async fn test_rejected_precision_leaves_challan_untouched() {
        let store = Arc::new(InMemoryStore::new());
        let challan = store.seed_posted_challan(dec!(1000));
        let service = ReconciliationService::new(Arc::clone(&store), "PKR");
        let entries_before = store.ledger_entry_count();

        let err = service
            .reconcile(payment(&challan, dec!(999.99999), "TX-1"))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AMOUNT");
        assert_eq!(store.challan(challan.id).paid_amount, Decimal::ZERO);
        assert_eq!(store.ledger_entry_count(), entries_before);

        // trailing zeros are not extra precision
        let ok = service
            .reconcile(payment(&challan, dec!(400.00000), "TX-2"))
            .await
            .unwrap();
        assert_eq!(ok.remaining_amount, dec!(600));
    }

    /// Scenario: 1000 billed, 400 paid, duplicate rejected, 600 paid.
    #[tokio::test]
    async fn test_end_to_end_partial_then_full_payment() {
        let store = Arc::new(InMemoryStore::new());
        let challan = store.seed_posted_challan(dec!(1000));
        let service = ReconciliationService::new(Arc::clone(&store), "PKR");
        let org = challan.organization_id;

        // 400 ⇒ PARTIALLY_PAID, balance 600
        let first = service.reconcile(payment(&challan, dec!(400), "TX-400")).await.unwrap();
        assert_eq!(first.challan_status, ChallanStatus::PartiallyPaid);
        assert_eq!(first.paid_amount, dec!(400));
        let statement = Ledger::load_statement(store.as_ref(), org, challan.student_id).await.unwrap();
        assert_eq!(statement.summary.balance, dec!(600));
        let credits: Vec<_> = statement
            .entries
            .iter()
            .filter(|e| e.direction == EntryDirection::Credit)
            .collect();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].amount, dec!(400));

        // identical resubmission ⇒ rejected, nothing changes
        let entries_before = store.ledger_entry_count();
        let err = service
            .reconcile(payment(&challan, dec!(400.00), " TX-400 "))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_PAYMENT");
        assert_eq!(store.ledger_entry_count(), entries_before);
        let unchanged = Ledger::load_statement(store.as_ref(), org, challan.student_id).await.unwrap();
        assert_eq!(unchanged.summary.balance, dec!(600));
        assert_eq!(store.challan(challan.id).paid_amount, dec!(400));

        // 600 ⇒ PAID, balance 0
        let second = service.reconcile(payment(&challan, dec!(600), "TX-600")).await.unwrap();
        assert_eq!(second.challan_status, ChallanStatus::Paid);
        assert_eq!(second.paid_amount, dec!(1000));
        assert_eq!(second.remaining_amount, Decimal::ZERO);

        let closing = Ledger::load_statement(store.as_ref(), org, challan.student_id).await.unwrap();
        let totals = LedgerTotals::from_entries(&closing.entries);
        assert_eq!(closing.summary.balance, Decimal::ZERO);
        assert_eq!(totals.debit, dec!(1000));
        assert_eq!(totals.credit, dec!(1000));
        assert!(closing.verified);
    }

    #[tokio::test]
    async fn test_paid_challan_rejects_further_payment() {
        let store = Arc::new(InMemoryStore::new());
        let challan = store.seed_posted_challan(dec!(500));
        let service = ReconciliationService::new(Arc::clone(&store), "PKR");

        service.reconcile(payment(&challan, dec!(500), "TX-1")).await.unwrap();
        let err = service
            .reconcile(payment(&challan, dec!(1), "TX-2"))
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "CHALLAN_ALREADY_PAID");
        assert_eq!(service.payments_for_challan(challan.organization_id, challan.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_challan_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let challan = sample_challan(dec!(500));
        let service = ReconciliationService::new(Arc::clone(&store), "PKR");

        let err = service.reconcile(payment(&challan, dec!(5), "TX-1")).await.unwrap_err();
        assert_eq!(err.error_code(), "CHALLAN_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_payment_on_cancelled_challan_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut challan = store.seed_posted_challan(dec!(500));
        challan.status = ChallanStatus::Cancelled;
        store.replace_challan(challan.clone());
        let service = ReconciliationService::new(Arc::clone(&store), "PKR");

        let err = service.reconcile(payment(&challan, dec!(5), "TX-1")).await.unwrap_err();
        assert_eq!(err.error_code(), "CHALLAN_CANCELLED");
    }
}
