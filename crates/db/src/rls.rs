//! Row-Level Security (RLS) context management.
//!
//! Every tenant table carries a `tenant_isolation` policy keyed on
//! `app.current_organization_id`. Repositories open one transaction per
//! unit of work and set the context before the first query.
//!
//! # Usage
//!
//! ```ignore
//! use sairex_db::rls::RlsConnection;
//!
//! let rls = RlsConnection::new(&db, organization_id).await?;
//! let challans = fee_challans::Entity::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```
//!
//! Platform jobs that must see every tenant (the orchestrator's organization
//! listing) use [`RlsConnection::platform`] instead.

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

/// A database transaction with RLS context applied.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction scoped to one organization.
    ///
    /// Uses `SET LOCAL`, so the setting ends with the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the RLS
    /// context cannot be set.
    pub async fn new(db: &DatabaseConnection, organization_id: Uuid) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, organization_id).await?;
        Ok(Self { txn })
    }

    /// Begins a transaction that sees every tenant.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started.
    pub async fn platform(db: &DatabaseConnection) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        txn.execute_unprepared(PLATFORM_CONTEXT_SQL).await?;
        Ok(Self { txn })
    }

    /// Returns the underlying transaction for executing queries.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

const PLATFORM_CONTEXT_SQL: &str = "SET LOCAL app.bypass_rls = 'on'";

fn rls_context_sql(organization_id: Uuid) -> String {
    // A `Uuid` renders as hex and hyphens only, so the literal is safe to inline.
    format!("SET LOCAL app.current_organization_id = '{organization_id}'")
}

/// Sets the RLS context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the RLS context cannot be set.
pub async fn set_rls_context(
    txn: &DatabaseTransaction,
    organization_id: Uuid,
) -> Result<(), DbErr> {
    txn.execute_unprepared(&rls_context_sql(organization_id)).await?;
    Ok(())
}
