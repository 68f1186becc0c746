//! Payment reconciliation persistence.

use chrono::{DateTime, Utc};
use sairex_core::billing::{BillingError, FeeChallan};
use sairex_core::payment::{
    PaymentRecord, PaymentStore, ReconcilePaymentInput, ReconciliationResult,
    ReconciliationService,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::ledger::append_entry;
use super::{billing_db_err, is_unique_violation};
use crate::entities::{fee_challans, payment_records};
use crate::rls::RlsConnection;

/// Repository for payment records.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl PaymentStore for PaymentRepository {
    async fn reconcile_payment(
        &self,
        input: ReconcilePaymentInput,
        default_currency: String,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationResult, BillingError> {
        let rls = RlsConnection::new(&self.db, input.organization_id)
            .await
            .map_err(billing_db_err)?;
        let txn = rls.transaction();

        // 1. Lock the challan; concurrent payments on it queue here
        let challan_model = fee_challans::Entity::find_by_id(input.challan_id)
            .filter(fee_challans::Column::OrganizationId.eq(input.organization_id))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(billing_db_err)?
            .ok_or(BillingError::ChallanNotFound(input.challan_id))?;
        let challan: FeeChallan = challan_model.clone().into();

        // 2. Natural-key lookup; NUMERIC equality ignores trailing zeros
        let key = input.natural_key();
        let duplicates = payment_records::Entity::find()
            .filter(payment_records::Column::ChallanId.eq(key.challan_id))
            .filter(payment_records::Column::ReferenceNumber.eq(key.reference_number.as_str()))
            .filter(payment_records::Column::PaymentDate.eq(key.payment_date))
            .filter(payment_records::Column::Amount.eq(key.amount))
            .filter(payment_records::Column::PaymentChannel.eq(key.payment_channel.as_str()))
            .count(txn)
            .await
            .map_err(billing_db_err)?;

        // 3. Plan
        let plan = ReconciliationService::<Self>::plan(
            &challan,
            &input,
            duplicates > 0,
            &default_currency,
            now,
        )?;
        let result = plan.result();

        // 4. Apply
        let payment = &plan.payment;
        let inserted = payment_records::ActiveModel {
            id: Set(payment.id),
            organization_id: Set(payment.organization_id),
            challan_id: Set(payment.challan_id),
            amount: Set(payment.amount),
            currency: Set(payment.currency.clone()),
            payment_channel: Set(payment.payment_channel.clone()),
            gateway: Set(payment.gateway.clone()),
            reference_number: Set(payment.reference_number.clone()),
            payment_date: Set(payment.payment_date),
            paid_at: Set(payment.paid_at.into()),
            status: Set(payment.status.into()),
            notes: Set(payment.notes.clone()),
            recorded_by: Set(payment.recorded_by),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await;

        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                // Lost a race with an identical submission
                rls.rollback().await.map_err(billing_db_err)?;
                return Err(BillingError::DuplicatePayment {
                    challan_id: key.challan_id,
                    reference_number: key.reference_number,
                });
            }
            return Err(billing_db_err(err));
        }

        let mut active: fee_challans::ActiveModel = challan_model.into();
        active.paid_amount = Set(plan.challan.paid_amount);
        active.status = Set(plan.challan.status.into());
        active.updated_at = Set(now.into());
        active.update(txn).await.map_err(billing_db_err)?;

        append_entry(txn, plan.credit, now).await?;
        rls.commit().await.map_err(billing_db_err)?;

        Ok(result)
    }

    async fn payments_for_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, BillingError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(billing_db_err)?;

        let rows = payment_records::Entity::find()
            .filter(payment_records::Column::OrganizationId.eq(organization_id))
            .filter(payment_records::Column::ChallanId.eq(challan_id))
            .order_by_asc(payment_records::Column::CreatedAt)
            .order_by_asc(payment_records::Column::Id)
            .all(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
