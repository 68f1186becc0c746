//! `SeaORM` entity definitions, one module per table.

pub mod prelude;

pub mod domain_events;
pub mod fee_challans;
pub mod fee_structures;
pub mod ledger_entries;
pub mod organization_billing_plans;
pub mod organizations;
pub mod payment_records;
pub mod revenue_adjustments;
pub mod revenue_cycles;
pub mod sea_orm_active_enums;
pub mod student_financial_summaries;
pub mod students;
