//! Revenue cycle persistence.

use chrono::Utc;
use rust_decimal::Decimal;
use sairex_core::revenue::{
    AdjustmentInput, AdjustmentOutcome, BillingPlan, CycleClosure, CycleInsert, CycleWindow,
    NewRevenueCycle, RevenueAdjustment, RevenueCalculationMode, RevenueCycle, RevenueCycleError,
    RevenueCycleLifecycle, RevenueCycleMetrics, RevenueCycleStore,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};
use uuid::Uuid;

use super::{is_unique_violation, revenue_db_err};
use crate::entities::{
    organization_billing_plans, revenue_adjustments, revenue_cycles,
    sea_orm_active_enums as db_enums,
};
use crate::rls::RlsConnection;

const PERIOD_METRICS_SQL: &str = r"
WITH generated AS (
    SELECT student_id, total_amount
    FROM fee_challans
    WHERE organization_id = $1
      AND status <> 'CANCELLED'
      AND issue_date >= $2
      AND issue_date < $3
),
collected AS (
    SELECT c.student_id, p.amount
    FROM payment_records p
    JOIN fee_challans c ON c.id = p.challan_id
    WHERE p.organization_id = $1
      AND p.status = 'RECONCILED'
      AND p.paid_at >= $4
      AND p.paid_at < $5
)
SELECT
    (SELECT COUNT(DISTINCT student_id) FROM generated) AS generated_students,
    (SELECT COUNT(DISTINCT student_id) FROM collected) AS collected_students,
    COALESCE((SELECT SUM(total_amount) FROM generated), 0) AS generated_amount,
    COALESCE((SELECT SUM(amount) FROM collected), 0) AS collected_amount
";

#[derive(Debug, FromQueryResult)]
struct MetricsRow {
    generated_students: i64,
    collected_students: i64,
    generated_amount: Decimal,
    collected_amount: Decimal,
}

impl MetricsRow {
    fn into_metrics(self, mode: RevenueCalculationMode) -> RevenueCycleMetrics {
        RevenueCycleMetrics {
            total_students: match mode {
                RevenueCalculationMode::OnGeneratedFee => self.generated_students,
                RevenueCalculationMode::OnCollectedFee => self.collected_students,
            },
            generated_amount: self.generated_amount,
            collected_amount: self.collected_amount,
        }
    }
}

fn db_int(value: u32) -> Result<i32, RevenueCycleError> {
    i32::try_from(value).map_err(|_| RevenueCycleError::Internal(format!("{value} exceeds INTEGER")))
}

/// Repository for revenue cycles, billing plans, and adjustments.
#[derive(Debug, Clone)]
pub struct RevenueCycleRepository {
    db: DatabaseConnection,
}

impl RevenueCycleRepository {
    /// Creates a new revenue cycle repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_one<C: ConnectionTrait>(
        conn: &C,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<revenue_cycles::Model>, RevenueCycleError> {
        revenue_cycles::Entity::find_by_id(cycle_id)
            .filter(revenue_cycles::Column::OrganizationId.eq(organization_id))
            .one(conn)
            .await
            .map_err(revenue_db_err)
    }
}

impl RevenueCycleStore for RevenueCycleRepository {
    async fn billing_plan(&self, organization_id: Uuid) -> Result<Option<BillingPlan>, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;

        let plan = organization_billing_plans::Entity::find_by_id(organization_id)
            .one(rls.transaction())
            .await
            .map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(plan.map(Into::into))
    }

    async fn insert_cycle(&self, cycle: NewRevenueCycle) -> Result<CycleInsert, RevenueCycleError> {
        let organization_id = cycle.organization_id;
        let (month, year) = (cycle.month, cycle.year);
        let now = Utc::now();

        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;

        let inserted = revenue_cycles::ActiveModel {
            id: Set(cycle.id),
            organization_id: Set(organization_id),
            month: Set(db_int(month)?),
            year: Set(year),
            revenue_calculation_mode_used: Set(cycle.revenue_calculation_mode_used.into()),
            per_student_fee_used: Set(cycle.per_student_fee_used),
            closing_day_used: Set(db_int(cycle.closing_day_used)?),
            total_students: Set(0),
            generated_amount: Set(Decimal::ZERO),
            collected_amount: Set(Decimal::ZERO),
            sairex_revenue: Set(Decimal::ZERO),
            status: Set(db_enums::RevenueCycleStatus::Open),
            closed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(rls.transaction())
        .await;

        match inserted {
            Ok(model) => {
                rls.commit().await.map_err(revenue_db_err)?;
                Ok(CycleInsert::Created(model.into()))
            }
            Err(err) if is_unique_violation(&err) => {
                // Another writer opened the period first
                rls.rollback().await.map_err(revenue_db_err)?;
                let existing = self
                    .find_cycle_for_period(organization_id, month, year)
                    .await?
                    .ok_or_else(|| {
                        RevenueCycleError::Internal(format!(
                            "cycle {year:04}-{month:02} conflicted but is not visible"
                        ))
                    })?;
                Ok(CycleInsert::AlreadyExists(existing))
            }
            Err(err) => Err(revenue_db_err(err)),
        }
    }

    async fn find_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;
        let cycle = Self::find_one(rls.transaction(), organization_id, cycle_id).await?;
        rls.commit().await.map_err(revenue_db_err)?;
        Ok(cycle.map(Into::into))
    }

    async fn find_cycle_for_period(
        &self,
        organization_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;

        let cycle = revenue_cycles::Entity::find()
            .filter(revenue_cycles::Column::OrganizationId.eq(organization_id))
            .filter(revenue_cycles::Column::Month.eq(db_int(month)?))
            .filter(revenue_cycles::Column::Year.eq(year))
            .one(rls.transaction())
            .await
            .map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(cycle.map(Into::into))
    }

    async fn list_cycles(&self, organization_id: Uuid) -> Result<Vec<RevenueCycle>, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;

        let cycles = revenue_cycles::Entity::find()
            .filter(revenue_cycles::Column::OrganizationId.eq(organization_id))
            .order_by_desc(revenue_cycles::Column::Year)
            .order_by_desc(revenue_cycles::Column::Month)
            .all(rls.transaction())
            .await
            .map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(cycles.into_iter().map(Into::into).collect())
    }

    async fn period_metrics(
        &self,
        organization_id: Uuid,
        window: CycleWindow,
        mode: RevenueCalculationMode,
    ) -> Result<RevenueCycleMetrics, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;

        let row = MetricsRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            PERIOD_METRICS_SQL,
            [
                organization_id.into(),
                window.start.date_naive().into(),
                window.end.date_naive().into(),
                window.start.into(),
                window.end.into(),
            ],
        ))
        .one(rls.transaction())
        .await
        .map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(row.map_or_else(RevenueCycleMetrics::default, |row| row.into_metrics(mode)))
    }

    async fn save_open_metrics(&self, cycle: RevenueCycle) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, cycle.organization_id)
            .await
            .map_err(revenue_db_err)?;

        let result = revenue_cycles::Entity::update_many()
            .set(revenue_cycles::ActiveModel {
                total_students: Set(cycle.total_students),
                generated_amount: Set(cycle.generated_amount),
                collected_amount: Set(cycle.collected_amount),
                sairex_revenue: Set(cycle.sairex_revenue),
                updated_at: Set(cycle.updated_at.into()),
                ..Default::default()
            })
            .filter(revenue_cycles::Column::Id.eq(cycle.id))
            .filter(revenue_cycles::Column::OrganizationId.eq(cycle.organization_id))
            .filter(revenue_cycles::Column::Status.eq(db_enums::RevenueCycleStatus::Open))
            .exec(rls.transaction())
            .await
            .map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok((result.rows_affected > 0).then_some(cycle))
    }

    async fn close_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
        closure: CycleClosure,
    ) -> Result<RevenueCycle, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;
        let txn = rls.transaction();

        // Conditional on OPEN: exactly one closer wins
        let result = revenue_cycles::Entity::update_many()
            .set(revenue_cycles::ActiveModel {
                per_student_fee_used: Set(closure.per_student_fee_used),
                closing_day_used: Set(db_int(closure.closing_day_used)?),
                total_students: Set(closure.metrics.total_students),
                generated_amount: Set(closure.metrics.generated_amount),
                collected_amount: Set(closure.metrics.collected_amount),
                sairex_revenue: Set(closure.sairex_revenue),
                status: Set(db_enums::RevenueCycleStatus::Closed),
                closed_at: Set(Some(closure.closed_at.into())),
                updated_at: Set(closure.closed_at.into()),
                ..Default::default()
            })
            .filter(revenue_cycles::Column::Id.eq(cycle_id))
            .filter(revenue_cycles::Column::OrganizationId.eq(organization_id))
            .filter(revenue_cycles::Column::Status.eq(db_enums::RevenueCycleStatus::Open))
            .exec(txn)
            .await
            .map_err(revenue_db_err)?;

        let model = Self::find_one(txn, organization_id, cycle_id)
            .await?
            .ok_or(RevenueCycleError::CycleNotFound(cycle_id))?;
        if result.rows_affected == 0 {
            return Err(RevenueCycleError::CycleAlreadyClosed(cycle_id));
        }

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(model.into())
    }

    async fn apply_adjustment(&self, input: AdjustmentInput) -> Result<AdjustmentOutcome, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, input.organization_id)
            .await
            .map_err(revenue_db_err)?;
        let txn = rls.transaction();
        let now = Utc::now();

        let model = revenue_cycles::Entity::find_by_id(input.revenue_cycle_id)
            .filter(revenue_cycles::Column::OrganizationId.eq(input.organization_id))
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(revenue_db_err)?
            .ok_or(RevenueCycleError::CycleNotFound(input.revenue_cycle_id))?;
        let cycle: RevenueCycle = model.clone().into();

        let (adjustment, adjusted) = RevenueCycleLifecycle::plan_adjustment(&cycle, &input, now)?;

        revenue_adjustments::ActiveModel {
            id: Set(adjustment.id),
            organization_id: Set(adjustment.organization_id),
            revenue_cycle_id: Set(adjustment.revenue_cycle_id),
            amount: Set(adjustment.amount),
            reason: Set(adjustment.reason.clone()),
            created_by: Set(adjustment.created_by),
            created_at: Set(adjustment.created_at.into()),
        }
        .insert(txn)
        .await
        .map_err(revenue_db_err)?;

        let mut active: revenue_cycles::ActiveModel = model.into();
        active.sairex_revenue = Set(adjusted.sairex_revenue);
        active.updated_at = Set(adjusted.updated_at.into());
        active.update(txn).await.map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(AdjustmentOutcome {
            adjustment,
            cycle: adjusted,
        })
    }

    async fn list_adjustments(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Vec<RevenueAdjustment>, RevenueCycleError> {
        let rls = RlsConnection::new(&self.db, organization_id)
            .await
            .map_err(revenue_db_err)?;

        let rows = revenue_adjustments::Entity::find()
            .filter(revenue_adjustments::Column::OrganizationId.eq(organization_id))
            .filter(revenue_adjustments::Column::RevenueCycleId.eq(cycle_id))
            .order_by_asc(revenue_adjustments::Column::CreatedAt)
            .order_by_asc(revenue_adjustments::Column::Id)
            .all(rls.transaction())
            .await
            .map_err(revenue_db_err)?;

        rls.commit().await.map_err(revenue_db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_metrics_row_picks_students_by_mode() {
        let row = || MetricsRow {
            generated_students: 40,
            collected_students: 25,
            generated_amount: dec!(200000),
            collected_amount: dec!(120000),
        };

        let generated = row().into_metrics(RevenueCalculationMode::OnGeneratedFee);
        assert_eq!(generated.total_students, 40);
        assert_eq!(generated.collected_amount, dec!(120000));

        let collected = row().into_metrics(RevenueCalculationMode::OnCollectedFee);
        assert_eq!(collected.total_students, 25);
        assert_eq!(collected.generated_amount, dec!(200000));
    }

    #[test]
    fn test_db_int_rejects_overflow() {
        assert_eq!(db_int(12).unwrap(), 12);
        assert!(db_int(u32::MAX).is_err());
    }
}
