//! Repository implementations of the core store traits.
//!
//! Every unit of work runs in one transaction with the tenant's RLS context
//! set. Multi-row writes (challan + debit + summary, payment + challan +
//! credit + summary, adjustment + cycle) commit or roll back together.

pub mod billing;
pub mod event;
pub mod fee_structure;
pub mod ledger;
pub mod mapping;
pub mod organization;
pub mod payment;
pub mod revenue_cycle;

pub use billing::BillingRepository;
pub use event::DomainEventRepository;
pub use organization::{NewOrganization, OrganizationRepository};
pub use payment::PaymentRepository;
pub use revenue_cycle::RevenueCycleRepository;

use sairex_core::billing::BillingError;
use sairex_core::revenue::RevenueCycleError;
use sea_orm::{DbErr, SqlErr};

/// Maps a database error into the billing domain.
pub(crate) fn billing_db_err(err: DbErr) -> BillingError {
    BillingError::Database(err.to_string())
}

/// Maps a database error into the revenue cycle domain.
pub(crate) fn revenue_db_err(err: DbErr) -> RevenueCycleError {
    RevenueCycleError::Database(err.to_string())
}

/// Returns true if the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
