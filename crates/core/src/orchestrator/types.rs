//! Orchestrator inputs and results.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sairex_shared::OrchestratorConfig;
use serde::Serialize;
use uuid::Uuid;

/// An active organization's scheduling attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationSchedule {
    /// Organization.
    pub organization_id: Uuid,
    /// Display name.
    pub name: String,
    /// IANA timezone, if configured.
    pub timezone: Option<String>,
    /// Plan closing day, if configured.
    pub closing_day: Option<i32>,
}

/// A state change (or confirmed no-op) in one organization's pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrchestratorAction {
    /// Current month's cycle was created.
    CreatedCurrentCycle,
    /// Current month's cycle already existed.
    CurrentCycleExists,
    /// Previous month's open cycle was closed.
    ClosedPreviousCycle,
    /// Previous month's cycle was already closed.
    PreviousCycleAlreadyClosed,
    /// No cycle exists for the previous month.
    PreviousCycleMissing,
}

impl OrchestratorAction {
    /// Returns true if the action changed persisted state.
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(self, Self::CreatedCurrentCycle | Self::ClosedPreviousCycle)
    }
}

/// Whether an organization's pass succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeResult {
    /// Pass completed.
    Succeeded,
    /// Pass failed; later organizations still ran.
    Failed {
        /// Stable error code.
        code: String,
        /// Error message.
        error: String,
    },
}

/// One organization's pass.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationOutcome {
    /// Organization.
    pub organization_id: Uuid,
    /// Resolved timezone name.
    pub timezone: String,
    /// Local date the pass ran against.
    pub local_date: NaiveDate,
    /// Actions completed before success or failure.
    pub actions: Vec<OrchestratorAction>,
    /// Result.
    pub result: OutcomeResult,
    /// Wall time spent.
    pub duration_ms: u64,
}

impl OrganizationOutcome {
    /// Returns true if the pass succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result == OutcomeResult::Succeeded
    }

    /// Returns true if the pass succeeded without changing state.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.succeeded() && !self.actions.iter().any(|a| a.is_change())
    }
}

/// Aggregate result of one orchestrator run.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSummary {
    /// False when another instance held the lock; all counters are zero.
    pub lock_acquired: bool,
    /// Organizations attempted.
    pub processed: usize,
    /// Organizations whose pass succeeded.
    pub succeeded: usize,
    /// Organizations whose pass failed.
    pub failed: usize,
    /// Succeeded organizations whose pass changed nothing.
    pub skipped: usize,
    /// Per-organization detail.
    pub outcomes: Vec<OrganizationOutcome>,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: DateTime<Utc>,
}

impl OrchestratorSummary {
    /// Summary for a run that lost the lock race.
    #[must_use]
    pub fn lock_not_acquired(at: DateTime<Utc>) -> Self {
        Self {
            lock_acquired: false,
            processed: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            outcomes: Vec::new(),
            started_at: at,
            finished_at: at,
        }
    }

    /// Aggregate per-organization outcomes.
    #[must_use]
    pub fn from_outcomes(
        outcomes: Vec<OrganizationOutcome>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        let skipped = outcomes.iter().filter(|o| o.is_noop()).count();
        Self {
            lock_acquired: true,
            processed: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            skipped,
            outcomes,
            started_at,
            finished_at,
        }
    }
}

/// Runtime settings resolved from configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Advisory lock name.
    pub lock_name: String,
    /// Timezone for organizations without a valid one.
    pub default_timezone: Tz,
    /// Closing day for plans without a valid one.
    pub default_closing_day: u32,
}

impl From<&OrchestratorConfig> for OrchestratorSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        let default_timezone = config.default_timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(
                timezone = %config.default_timezone,
                "unknown default timezone, using UTC"
            );
            chrono_tz::UTC
        });
        Self {
            lock_name: config.lock_name.clone(),
            default_timezone,
            default_closing_day: super::schedule::closing_day_or(config.default_closing_day),
        }
    }
}
