//! Organization listing seam for the orchestrator.

use thiserror::Error;

use super::lock::LockError;
use super::types::OrganizationSchedule;

/// Errors that abort a whole orchestrator run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Lock backend failed.
    #[error(transparent)]
    Lock(#[from] LockError),

    /// Organizations could not be listed.
    #[error("Failed to list organizations: {0}")]
    Directory(String),
}

impl OrchestratorError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Lock(e) => e.error_code(),
            Self::Directory(_) => "DATABASE_ERROR",
        }
    }
}

/// Source of organizations the orchestrator visits.
///
/// This trait is implemented by the db crate.
pub trait OrganizationDirectory: Send + Sync {
    /// Active organizations with their timezone and plan closing day.
    fn active_organizations(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<OrganizationSchedule>, OrchestratorError>> + Send;
}
