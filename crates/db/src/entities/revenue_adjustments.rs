//! `SeaORM` Entity for revenue_adjustments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "revenue_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub revenue_cycle_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub reason: String,
    pub created_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::revenue_cycles::Entity",
        from = "Column::RevenueCycleId",
        to = "super::revenue_cycles::Column::Id"
    )]
    RevenueCycles,
}

impl Related<super::revenue_cycles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RevenueCycles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
