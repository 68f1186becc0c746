//! `SeaORM` Entity for payment_records table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PaymentStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub challan_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub currency: String,
    pub payment_channel: String,
    pub gateway: Option<String>,
    pub reference_number: String,
    pub payment_date: Date,
    pub paid_at: DateTimeWithTimeZone,
    pub status: PaymentStatus,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fee_challans::Entity",
        from = "Column::ChallanId",
        to = "super::fee_challans::Column::Id"
    )]
    FeeChallans,
}

impl Related<super::fee_challans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeChallans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
