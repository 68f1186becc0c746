//! Ledger reads and the shared append path.

use chrono::{DateTime, Utc};
use sairex_core::billing::BillingError;
use sairex_core::ledger::{LedgerEntry, LedgerStore, NewLedgerEntry, StudentFinancialSummary};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::billing::BillingRepository;
use super::billing_db_err;
use crate::entities::{ledger_entries, student_financial_summaries};
use crate::rls::RlsConnection;

/// Appends one entry and folds it into the student's summary.
///
/// Must run inside the caller's transaction. The summary row is created on
/// first use and locked `FOR UPDATE` before the totals change, so concurrent
/// writers for the same student serialize on it.
pub(crate) async fn append_entry(
    txn: &DatabaseTransaction,
    entry: NewLedgerEntry,
    now: DateTime<Utc>,
) -> Result<LedgerEntry, BillingError> {
    let mut summary = lock_summary(txn, entry.organization_id, entry.student_id).await?;
    summary.apply(&entry)?;

    let model = ledger_entries::ActiveModel {
        id: Set(entry.id),
        organization_id: Set(entry.organization_id),
        campus_id: Set(entry.campus_id),
        student_id: Set(entry.student_id),
        challan_id: Set(entry.challan_id),
        entry_type: Set(entry.entry_type.into()),
        direction: Set(entry.direction.into()),
        amount: Set(entry.amount),
        reference_id: Set(entry.reference_id),
        reference_type: Set(entry.reference_type.clone()),
        entry_date: Set(entry.entry_date),
        description: Set(entry.description.clone()),
        created_at: Set(now.into()),
    }
    .insert(txn)
    .await
    .map_err(billing_db_err)?;

    student_financial_summaries::ActiveModel {
        student_id: Set(summary.student_id),
        organization_id: Set(summary.organization_id),
        total_debit: Set(summary.total_debit),
        total_credit: Set(summary.total_credit),
        balance: Set(summary.balance),
        updated_at: Set(now.into()),
    }
    .update(txn)
    .await
    .map_err(billing_db_err)?;

    Ok(model.into())
}

async fn lock_summary(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
    student_id: Uuid,
) -> Result<StudentFinancialSummary, BillingError> {
    let empty = StudentFinancialSummary::empty(organization_id, student_id);
    student_financial_summaries::Entity::insert(student_financial_summaries::ActiveModel {
        student_id: Set(student_id),
        organization_id: Set(organization_id),
        total_debit: Set(empty.total_debit),
        total_credit: Set(empty.total_credit),
        balance: Set(empty.balance),
        updated_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::column(student_financial_summaries::Column::StudentId)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await
    .map_err(billing_db_err)?;

    let model = student_financial_summaries::Entity::find_by_id(student_id)
        .filter(student_financial_summaries::Column::OrganizationId.eq(organization_id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(billing_db_err)?
        .ok_or_else(|| {
            BillingError::Internal(format!("summary row for student {student_id} is not visible"))
        })?;

    Ok(model.into())
}

impl LedgerStore for BillingRepository {
    async fn student_entries(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, BillingError> {
        let rls = RlsConnection::new(self.connection(), organization_id)
            .await
            .map_err(billing_db_err)?;

        let entries = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::OrganizationId.eq(organization_id))
            .filter(ledger_entries::Column::StudentId.eq(student_id))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .order_by_asc(ledger_entries::Column::Id)
            .all(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(entries.into_iter().map(Into::into).collect())
    }

    async fn student_summary(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<StudentFinancialSummary>, BillingError> {
        let rls = RlsConnection::new(self.connection(), organization_id)
            .await
            .map_err(billing_db_err)?;

        let summary = student_financial_summaries::Entity::find_by_id(student_id)
            .filter(student_financial_summaries::Column::OrganizationId.eq(organization_id))
            .one(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(summary.map(Into::into))
    }
}
