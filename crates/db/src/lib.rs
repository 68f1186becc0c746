//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Implementations of the `sairex-core` store traits
//! - A `PostgreSQL` advisory lock for the orchestrator
//! - Database migrations

pub mod entities;
pub mod lock;
pub mod migration;
pub mod repositories;
pub mod rls;

pub use lock::{PgAdvisoryLock, PgLockGuard, advisory_key};
pub use repositories::{
    BillingRepository, DomainEventRepository, NewOrganization, OrganizationRepository,
    PaymentRepository, RevenueCycleRepository,
};

use std::time::Duration;

use sairex_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
