//! Fee structure reads.

use sairex_core::billing::BillingError;
use sairex_core::fees::{FeeRule, FeeStructureStore};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use super::billing::BillingRepository;
use super::billing_db_err;
use crate::entities::fee_structures;
use crate::rls::RlsConnection;

impl FeeStructureStore for BillingRepository {
    async fn active_fee_rules(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
    ) -> Result<Vec<FeeRule>, BillingError> {
        let rls = RlsConnection::new(self.connection(), organization_id)
            .await
            .map_err(billing_db_err)?;

        let rules = fee_structures::Entity::find()
            .filter(fee_structures::Column::OrganizationId.eq(organization_id))
            .filter(fee_structures::Column::CampusId.eq(campus_id))
            .filter(fee_structures::Column::IsActive.eq(true))
            .order_by_asc(fee_structures::Column::Id)
            .all(rls.transaction())
            .await
            .map_err(billing_db_err)?;

        rls.commit().await.map_err(billing_db_err)?;
        Ok(rules.into_iter().map(Into::into).collect())
    }
}
