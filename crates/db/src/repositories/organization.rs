//! Organizations, billing plans, and the orchestrator's tenant listing.

use chrono::Utc;
use sairex_core::orchestrator::{OrchestratorError, OrganizationDirectory, OrganizationSchedule};
use sairex_core::revenue::BillingPlan;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::entities::{organization_billing_plans, organizations};
use crate::rls::RlsConnection;

/// Input for creating an organization.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    /// Display name.
    pub name: String,
    /// Unique URL slug.
    pub slug: String,
    /// IANA timezone; the orchestrator default applies when `None`.
    pub timezone: Option<String>,
}

/// Organization repository.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<organizations::Model>, DbErr> {
        let rls = RlsConnection::new(&self.db, id).await?;
        let org = organizations::Entity::find_by_id(id).one(rls.transaction()).await?;
        rls.commit().await?;
        Ok(org)
    }

    /// Creates an active organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g., the slug is taken).
    pub async fn create(&self, input: NewOrganization) -> Result<organizations::Model, DbErr> {
        let id = Uuid::now_v7();
        let now = Utc::now().into();
        let rls = RlsConnection::new(&self.db, id).await?;

        let org = organizations::ActiveModel {
            id: Set(id),
            name: Set(input.name),
            slug: Set(input.slug),
            timezone: Set(input.timezone),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(rls.transaction())
        .await?;

        rls.commit().await?;
        Ok(org)
    }

    /// Creates or replaces an organization's live billing plan.
    ///
    /// Closed revenue cycles keep the terms they snapshotted.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert_billing_plan(&self, plan: &BillingPlan) -> Result<(), DbErr> {
        let now = Utc::now();
        let rls = RlsConnection::new(&self.db, plan.organization_id).await?;

        organization_billing_plans::Entity::insert(organization_billing_plans::ActiveModel {
            organization_id: Set(plan.organization_id),
            revenue_calculation_mode: Set(plan.revenue_calculation_mode.into()),
            per_student_fee: Set(plan.per_student_fee),
            closing_day: Set(plan.closing_day),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        })
        .on_conflict(
            OnConflict::column(organization_billing_plans::Column::OrganizationId)
                .update_columns([
                    organization_billing_plans::Column::RevenueCalculationMode,
                    organization_billing_plans::Column::PerStudentFee,
                    organization_billing_plans::Column::ClosingDay,
                    organization_billing_plans::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(rls.transaction())
        .await?;

        rls.commit().await
    }
}

impl OrganizationDirectory for OrganizationRepository {
    async fn active_organizations(&self) -> Result<Vec<OrganizationSchedule>, OrchestratorError> {
        let directory_err = |e: DbErr| OrchestratorError::Directory(e.to_string());

        // Cross-tenant by nature: the only read that runs without a tenant context
        let rls = RlsConnection::platform(&self.db).await.map_err(directory_err)?;

        let rows = organizations::Entity::find()
            .filter(organizations::Column::IsActive.eq(true))
            .find_also_related(organization_billing_plans::Entity)
            .order_by_asc(organizations::Column::Name)
            .order_by_asc(organizations::Column::Id)
            .all(rls.transaction())
            .await
            .map_err(directory_err)?;

        rls.commit().await.map_err(directory_err)?;

        Ok(rows
            .into_iter()
            .map(|(org, plan)| OrganizationSchedule {
                organization_id: org.id,
                name: org.name,
                timezone: org.timezone,
                closing_day: plan.and_then(|p| p.closing_day),
            })
            .collect())
    }
}
