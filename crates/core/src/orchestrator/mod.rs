//! Scheduled revenue cycle orchestration.
//!
//! One run at a time across all instances, guarded by a named advisory lock.
//! Organizations are processed independently; a failing tenant is recorded
//! and the run moves on.

pub mod lock;
pub mod schedule;
pub mod service;
pub mod store;
pub mod types;

pub use lock::{AdvisoryLock, InProcessGuard, InProcessLock, LockError};
pub use schedule::{LocalSchedule, resolve_timezone};
pub use service::Orchestrator;
pub use store::{OrchestratorError, OrganizationDirectory};
pub use types::{
    OrchestratorAction, OrchestratorSettings, OrchestratorSummary, OrganizationOutcome,
    OrganizationSchedule, OutcomeResult,
};
