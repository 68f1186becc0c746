//! `PostgreSQL` advisory lock for the orchestrator.
//!
//! The lock is transaction-scoped (`pg_try_advisory_xact_lock`): the guard
//! owns the open transaction, so the lock is held on one pooled connection
//! and is released on commit, on rollback, or when the connection dies.

use sairex_core::orchestrator::{AdvisoryLock, LockError};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, Statement, TransactionTrait,
};
use sha2::{Digest, Sha256};

/// Advisory lock backed by the primary database.
#[derive(Debug, Clone)]
pub struct PgAdvisoryLock {
    db: DatabaseConnection,
}

/// A held advisory lock.
pub struct PgLockGuard {
    name: String,
    key: i64,
    txn: DatabaseTransaction,
}

impl PgLockGuard {
    /// Name of the held lock.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Advisory lock key derived from the name.
    #[must_use]
    pub const fn key(&self) -> i64 {
        self.key
    }
}

impl std::fmt::Debug for PgLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgLockGuard")
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Maps a lock name to a 64-bit advisory key.
///
/// First eight bytes of SHA-256, big-endian. Stable across processes and
/// releases, so every instance contends on the same key.
#[must_use]
pub fn advisory_key(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

impl PgAdvisoryLock {
    /// Creates a lock backend on the given pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn backend(err: sea_orm::DbErr) -> LockError {
    LockError::Backend(err.to_string())
}

impl AdvisoryLock for PgAdvisoryLock {
    type Guard = PgLockGuard;

    async fn try_acquire(&self, name: &str) -> Result<Option<Self::Guard>, LockError> {
        let key = advisory_key(name);
        let txn = self.db.begin().await.map_err(backend)?;

        let row = txn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT pg_try_advisory_xact_lock($1) AS acquired",
                [key.into()],
            ))
            .await
            .map_err(backend)?;
        let acquired = match row {
            Some(row) => row.try_get::<bool>("", "acquired").map_err(backend)?,
            None => false,
        };

        if !acquired {
            txn.rollback().await.map_err(backend)?;
            return Ok(None);
        }

        tracing::debug!(lock = name, key, "advisory lock acquired");
        Ok(Some(PgLockGuard {
            name: name.to_string(),
            key,
            txn,
        }))
    }

    async fn release(&self, guard: Self::Guard) -> Result<(), LockError> {
        let PgLockGuard { name, key, txn } = guard;
        txn.commit().await.map_err(backend)?;
        tracing::debug!(lock = %name, key, "advisory lock released");
        Ok(())
    }
}
