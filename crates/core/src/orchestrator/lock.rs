//! Named, non-blocking mutual exclusion across orchestrator instances.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::OwnedMutexGuard;

/// Errors from a lock backend.
#[derive(Debug, Error)]
pub enum LockError {
    /// Backend could not be reached or answered with an error.
    #[error("Lock backend error: {0}")]
    Backend(String),
}

impl LockError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "LOCK_BACKEND_ERROR",
        }
    }
}

/// Try-acquire / release capability over a named lock.
///
/// `try_acquire` never waits: `Ok(None)` means another holder is active.
/// Implemented in-process here and by PostgreSQL advisory locks in the db crate.
pub trait AdvisoryLock: Send + Sync {
    /// Proof of ownership handed back to `release`.
    type Guard: Send;

    /// Acquire `name` if free.
    fn try_acquire(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Self::Guard>, LockError>> + Send;

    /// Release a held lock.
    fn release(
        &self,
        guard: Self::Guard,
    ) -> impl std::future::Future<Output = Result<(), LockError>> + Send;
}

/// Lock scoped to the current process.
#[derive(Debug, Default)]
pub struct InProcessLock {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Held in-process lock; dropping it also releases.
#[derive(Debug)]
pub struct InProcessGuard {
    name: String,
    _held: OwnedMutexGuard<()>,
}

impl InProcessGuard {
    /// Name of the held lock.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl InProcessLock {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, name: &str) -> Result<Arc<tokio::sync::Mutex<()>>, LockError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| LockError::Backend(format!("lock table poisoned: {e}")))?;
        Ok(Arc::clone(slots.entry(name.to_string()).or_default()))
    }
}

impl AdvisoryLock for InProcessLock {
    type Guard = InProcessGuard;

    async fn try_acquire(&self, name: &str) -> Result<Option<Self::Guard>, LockError> {
        let slot = self.slot(name)?;
        Ok(slot.try_lock_owned().ok().map(|held| InProcessGuard {
            name: name.to_string(),
            _held: held,
        }))
    }

    async fn release(&self, guard: Self::Guard) -> Result<(), LockError> {
        drop(guard);
        Ok(())
    }
}
