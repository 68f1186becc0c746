//! `SeaORM` Entity for ledger_entries table.
//!
//! Rows are append-only; the database rejects UPDATE and DELETE.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryDirection, LedgerEntryType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub campus_id: Uuid,
    pub student_id: Uuid,
    pub challan_id: Option<Uuid>,
    pub entry_type: LedgerEntryType,
    pub direction: EntryDirection,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub reference_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub entry_date: Date,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
    #[sea_orm(
        belongs_to = "super::fee_challans::Entity",
        from = "Column::ChallanId",
        to = "super::fee_challans::Column::Id"
    )]
    FeeChallans,
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

impl ActiveModelBehavior for ActiveModel {}
