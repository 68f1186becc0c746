//! Challan persistence: posting, lookup, and cancellation.

use chrono::{DateTime, Utc};
use sairex_core::billing::{
    BillingError, BillingStore, CancelChallanInput, ChallanFilter, ChallanInsert,
    ChallanLifecycle, FeeChallan, NewChallan, Student,
};
use sairex_core::ledger::NewLedgerEntry;
use sairex_shared::types::PageRequest;
use sea_orm::sea_query::{Alias, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::ledger::append_entry;
use super::{billing_db_err, is_unique_violation};
use crate::entities::{fee_challans, sea_orm_active_enums as db_enums, students};
use crate::rls::RlsConnection;

/// Repository for challans, students, fee rules, and ledger reads.
#[derive(Debug, Clone)]
pub struct BillingRepository {
    db: DatabaseConnection,
}

impl BillingRepository {
    /// Creates a new billing repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl BillingStore for BillingRepository {
    async fn active_students(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
        grade: &str,
    ) -> Result<Vec<Student>, BillingError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(billing_db_err)?;

        let rows = students::Entity::find()
            .filter(students::Column::OrganizationId.eq(organization_id))
            .filter(students::Column::CampusId.eq(campus_id))
            .filter(
                Expr::expr(Func::lower(
                    Func::cust(Alias::new("TRIM")).arg(Expr::col(students::Column::Grade)),
                ))
                .eq(grade.trim().to_lowercase()),
            )
            .filter(students::Column::IsActive.eq(true))
            .order_by_asc(students::Column::Id)
            .all(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_challan_by_number(
        &self,
        organization_id: Uuid,
        challan_no: &str,
    ) -> Result<Option<FeeChallan>, BillingError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(billing_db_err)?;

        let challan = fee_challans::Entity::find()
            .filter(fee_challans::Column::OrganizationId.eq(organization_id))
            .filter(fee_challans::Column::ChallanNo.eq(challan_no))
            .one(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(challan.map(Into::into))
    }

    async fn insert_challan(
        &self,
        challan: NewChallan,
        debit: NewLedgerEntry,
    ) -> Result<ChallanInsert, BillingError> {
        let rls = RlsConnection::new(&self.db, challan.organization_id)
            .await
            .map_err(billing_db_err)?;
        let txn = rls.transaction();
        let now = Utc::now();

        let inserted = fee_challans::ActiveModel {
            id: Set(challan.id),
            organization_id: Set(challan.organization_id),
            campus_id: Set(challan.campus_id),
            student_id: Set(challan.student_id),
            challan_no: Set(challan.challan_no.clone()),
            billing_period: Set(challan.billing_period.to_string()),
            issue_date: Set(challan.issue_date),
            due_date: Set(challan.due_date),
            total_amount: Set(challan.total_amount),
            paid_amount: Set(rust_decimal::Decimal::ZERO),
            status: Set(db_enums::ChallanStatus::Unpaid),
            generated_by: Set(challan.generated_by),
            cancelled_at: Set(None),
            cancelled_by: Set(None),
            cancellation_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(txn)
        .await;

        let inserted = match inserted {
            Ok(model) => model,
            Err(err) if is_unique_violation(&err) => {
                rls.rollback().await.map_err(billing_db_err)?;
                return Ok(ChallanInsert::AlreadyExists);
            }
            Err(err) => return Err(billing_db_err(err)),
        };

        append_entry(txn, debit, now).await?;
        rls.commit().await.map_err(billing_db_err)?;

        Ok(ChallanInsert::Created(inserted.into()))
    }

    async fn find_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> Result<Option<FeeChallan>, BillingError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(billing_db_err)?;

        let challan = fee_challans::Entity::find_by_id(challan_id)
            .filter(fee_challans::Column::OrganizationId.eq(organization_id))
            .one(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(challan.map(Into::into))
    }

    async fn list_challans(
        &self,
        organization_id: Uuid,
        filter: ChallanFilter,
        page: PageRequest,
    ) -> Result<(Vec<FeeChallan>, u64), BillingError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(billing_db_err)?;

        let mut query =
            fee_challans::Entity::find().filter(fee_challans::Column::OrganizationId.eq(organization_id));
        if let Some(student_id) = filter.student_id {
            query = query.filter(fee_challans::Column::StudentId.eq(student_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(fee_challans::Column::Status.eq(db_enums::ChallanStatus::from(status)));
        }
        if let Some(period) = filter.billing_period {
            query = query.filter(fee_challans::Column::BillingPeriod.eq(period));
        }

        let total = query
            .clone()
            .count(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        let page = page.normalized();
        let rows = query
            .order_by_desc(fee_challans::Column::CreatedAt)
            .order_by_desc(fee_challans::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn cancel_challan(
        &self,
        input: CancelChallanInput,
        now: DateTime<Utc>,
    ) -> Result<FeeChallan, BillingError> {
        let rls = RlsConnection::new(&self.db, input.organization_id)
            .await
            .map_err(billing_db_err)?;
        let txn = rls.transaction();

        // Row lock serializes cancellation against concurrent payments
        let model = fee_challans::Entity::find_by_id(input.challan_id)
            .filter(fee_challans::Column::OrganizationId.eq(input.organization_id))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(billing_db_err)?
            .ok_or(BillingError::ChallanNotFound(input.challan_id))?;

        let challan: FeeChallan = model.clone().into();
        let plan = ChallanLifecycle::plan_cancellation(&challan, &input.reason, now)?;

        let mut active: fee_challans::ActiveModel = model.into();
        active.status = Set(db_enums::ChallanStatus::Cancelled);
        active.cancelled_at = Set(Some(now.into()));
        active.cancelled_by = Set(Some(input.cancelled_by));
        active.cancellation_reason = Set(plan.challan.cancellation_reason.clone());
        active.updated_at = Set(now.into());
        active.update(txn).await.map_err(billing_db_err)?;

        append_entry(txn, plan.waiver, now).await?;
        rls.commit().await.map_err(billing_db_err)?;

        Ok(plan.challan)
    }
}
