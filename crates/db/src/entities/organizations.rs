//! `SeaORM` Entity for organizations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub timezone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::organization_billing_plans::Entity")]
    OrganizationBillingPlans,
    #[sea_orm(has_many = "super::students::Entity")]
    Students,
    #[sea_orm(has_many = "super::fee_challans::Entity")]
    FeeChallans,
    #[sea_orm(has_many = "super::revenue_cycles::Entity")]
    RevenueCycles,
}

impl Related<super::organization_billing_plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrganizationBillingPlans.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl Related<super::fee_challans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FeeChallans.def()
    }
}

impl Related<super::revenue_cycles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RevenueCycles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
