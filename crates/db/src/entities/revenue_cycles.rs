//! `SeaORM` Entity for revenue_cycles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{RevenueCalculationMode, RevenueCycleStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "revenue_cycles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub month: i32,
    pub year: i32,
    pub revenue_calculation_mode_used: RevenueCalculationMode,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub per_student_fee_used: Decimal,
    pub closing_day_used: i32,
    pub total_students: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub generated_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub collected_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub sairex_revenue: Decimal,
    pub status: RevenueCycleStatus,
    pub closed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::organizations::Entity",
        from = "Column::OrganizationId",
        to = "super::organizations::Column::Id"
    )]
    Organizations,
    #[sea_orm(has_many = "super::revenue_adjustments::Entity")]
    RevenueAdjustments,
}

impl Related<super::organizations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Organizations.def()
    }
}

impl Related<super::revenue_adjustments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RevenueAdjustments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
