//! Lock-protected, per-organization revenue cycle run.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use super::lock::AdvisoryLock;
use super::schedule::LocalSchedule;
use super::store::{OrchestratorError, OrganizationDirectory};
use super::types::{
    OrchestratorAction, OrchestratorSettings, OrchestratorSummary, OrganizationOutcome,
    OrganizationSchedule, OutcomeResult,
};
use crate::events::{DomainEvent, DomainEventType, EventSink};
use crate::revenue::{RevenueCycleError, RevenueCycleService, RevenueCycleStore};

/// Scheduled revenue cycle orchestrator.
///
/// Each run creates the current month's cycle for every active organization
/// and, on the organization's closing day, closes the previous month's cycle.
pub struct Orchestrator<D, R, L, E> {
    directory: Arc<D>,
    cycles: RevenueCycleService<R>,
    lock: Arc<L>,
    events: Arc<E>,
    settings: OrchestratorSettings,
}

impl<D, R, L, E> Orchestrator<D, R, L, E>
where
    D: OrganizationDirectory,
    R: RevenueCycleStore,
    L: AdvisoryLock,
    E: EventSink,
{
    /// Create an orchestrator.
    #[must_use]
    pub fn new(
        directory: Arc<D>,
        cycles: RevenueCycleService<R>,
        lock: Arc<L>,
        events: Arc<E>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            directory,
            cycles,
            lock,
            events,
            settings,
        }
    }

    /// Run once as of `now`.
    ///
    /// Steps:
    /// 1. Try the advisory lock; if held elsewhere, return a zero summary
    /// 2. Visit every active organization, isolating failures
    /// 3. Release the lock, on success and on error
    ///
    /// # Errors
    ///
    /// Returns `OrchestratorError` only when the lock backend or the
    /// organization listing fails. Per-organization failures are reported
    /// in the summary.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<OrchestratorSummary, OrchestratorError> {
        // 1. Non-blocking acquire
        let Some(guard) = self.lock.try_acquire(&self.settings.lock_name).await? else {
            tracing::info!(
                lock = %self.settings.lock_name,
                "orchestrator lock held by another instance, skipping run"
            );
            return Ok(OrchestratorSummary::lock_not_acquired(now));
        };

        // 2. Work
        let result = self.run_locked(now).await;

        // 3. Always release
        if let Err(err) = self.lock.release(guard).await {
            tracing::error!(
                lock = %self.settings.lock_name,
                error = %err,
                "failed to release orchestrator lock"
            );
        }

        let summary = result?;

        tracing::info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "revenue cycle orchestrator completed"
        );
        self.emit(DomainEvent::new(
            None,
            DomainEventType::RevenueCycleOrchestratorCompleted,
            json!({
                "processed": summary.processed,
                "succeeded": summary.succeeded,
                "failed": summary.failed,
                "skipped": summary.skipped,
            }),
            summary.finished_at,
        ))
        .await;

        Ok(summary)
    }

    async fn run_locked(&self, now: DateTime<Utc>) -> Result<OrchestratorSummary, OrchestratorError> {
        let organizations = self.directory.active_organizations().await?;
        tracing::debug!(count = organizations.len(), "orchestrating organizations");

        let mut outcomes = Vec::with_capacity(organizations.len());
        for organization in &organizations {
            outcomes.push(self.process_organization(organization, now).await);
        }

        Ok(OrchestratorSummary::from_outcomes(outcomes, now, Utc::now()))
    }

    async fn process_organization(
        &self,
        organization: &OrganizationSchedule,
        now: DateTime<Utc>,
    ) -> OrganizationOutcome {
        let started = Instant::now();
        let local = LocalSchedule::at(
            organization,
            now,
            self.settings.default_timezone,
            self.settings.default_closing_day,
        );

        let mut actions = Vec::new();
        let result = match self
            .run_pass(organization.organization_id, &local, &mut actions)
            .await
        {
            Ok(()) => OutcomeResult::Succeeded,
            Err(err) => {
                tracing::error!(
                    organization_id = %organization.organization_id,
                    error_code = err.error_code(),
                    error = %err,
                    "revenue cycle orchestration failed for organization"
                );
                self.emit(DomainEvent::new(
                    Some(organization.organization_id),
                    DomainEventType::RevenueCycleOrchestrationFailed,
                    json!({
                        "error_code": err.error_code(),
                        "error": err.to_string(),
                        "local_date": local.local_date,
                    }),
                    Utc::now(),
                ))
                .await;
                OutcomeResult::Failed {
                    code: err.error_code().to_string(),
                    error: err.to_string(),
                }
            }
        };

        OrganizationOutcome {
            organization_id: organization.organization_id,
            timezone: local.timezone.name().to_string(),
            local_date: local.local_date,
            actions,
            result,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create the current cycle, then close the previous one on closing day.
    async fn run_pass(
        &self,
        organization_id: Uuid,
        local: &LocalSchedule,
        actions: &mut Vec<OrchestratorAction>,
    ) -> Result<(), RevenueCycleError> {
        let (month, year) = local.current_period();
        let creation = self
            .cycles
            .create_monthly_cycle(organization_id, month, year)
            .await?;

        if creation.created {
            actions.push(OrchestratorAction::CreatedCurrentCycle);
            self.emit(DomainEvent::new(
                Some(organization_id),
                DomainEventType::RevenueCycleCreated,
                json!({
                    "cycle_id": creation.cycle.id,
                    "month": month,
                    "year": year,
                }),
                creation.cycle.created_at,
            ))
            .await;
        } else {
            actions.push(OrchestratorAction::CurrentCycleExists);
        }

        if !local.is_closing_day() {
            return Ok(());
        }

        let (prev_month, prev_year) = local.previous_period();
        match self
            .cycles
            .find_cycle_for_period(organization_id, prev_month, prev_year)
            .await?
        {
            None => actions.push(OrchestratorAction::PreviousCycleMissing),
            Some(cycle) if cycle.is_closed() => {
                actions.push(OrchestratorAction::PreviousCycleAlreadyClosed);
            }
            Some(cycle) => {
                let closed = self.cycles.close_cycle(organization_id, cycle.id).await?;
                actions.push(OrchestratorAction::ClosedPreviousCycle);
                self.emit(DomainEvent::new(
                    Some(organization_id),
                    DomainEventType::RevenueCycleClosed,
                    json!({
                        "cycle_id": closed.id,
                        "month": closed.month,
                        "year": closed.year,
                        "total_students": closed.total_students,
                        "sairex_revenue": closed.sairex_revenue,
                    }),
                    closed.closed_at.unwrap_or_else(Utc::now),
                ))
                .await;
            }
        }

        Ok(())
    }

    async fn emit(&self, event: DomainEvent) {
        let event_type = event.event_type;
        if let Err(err) = self.events.record(event).await {
            tracing::warn!(event_type = %event_type, error = %err, "domain event not recorded");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::orchestrator::lock::InProcessLock;
    use crate::revenue::{RevenueCalculationMode, RevenueCycleStatus};
    use crate::testing::InMemoryStore;

    type TestOrchestrator = Orchestrator<InMemoryStore, InMemoryStore, InProcessLock, InMemoryStore>;

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            lock_name: "revenue_cycle_orchestrator".into(),
            default_timezone: chrono_tz::UTC,
            default_closing_day: 10,
        }
    }

    fn orchestrator(store: &Arc<InMemoryStore>, lock: &Arc<InProcessLock>) -> TestOrchestrator {
        Orchestrator::new(
            Arc::clone(store),
            RevenueCycleService::new(Arc::clone(store), 10),
            Arc::clone(lock),
            Arc::clone(store),
            settings(),
        )
    }

    fn closing_day_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 10, 12, 0, 0).unwrap()
    }

    fn add_org(store: &InMemoryStore, name: &str) -> Uuid {
        let org = store.add_organization(name, None);
        store.set_billing_plan(org, RevenueCalculationMode::OnGeneratedFee, dec!(100), Some(10));
        org
    }

    #[tokio::test]
    async fn test_failing_organization_is_isolated() {
        let store = Arc::new(InMemoryStore::new());
        let lock = Arc::new(InProcessLock::new());
        let a = add_org(&store, "A");
        let b = add_org(&store, "B");
        let c = add_org(&store, "C");

        let cycles = RevenueCycleService::new(Arc::clone(&store), 10);
        let prev_a = cycles.create_monthly_cycle(a, 3, 2026).await.unwrap().cycle;
        let prev_c = cycles.create_monthly_cycle(c, 3, 2026).await.unwrap().cycle;
        store.fail_cycle_creation_for(b);

        let summary = orchestrator(&store, &lock).run(closing_day_noon()).await.unwrap();

        assert!(summary.lock_acquired);
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);

        for (org, prev) in [(a, &prev_a), (c, &prev_c)] {
            let current = cycles.find_cycle_for_period(org, 4, 2026).await.unwrap().unwrap();
            assert_eq!(current.status, RevenueCycleStatus::Open);
            assert!(cycles.get_cycle(org, prev.id).await.unwrap().is_closed());
        }
        assert!(cycles.find_cycle_for_period(b, 4, 2026).await.unwrap().is_none());

        let failed = summary
            .outcomes
            .iter()
            .find(|o| o.organization_id == b)
            .unwrap();
        assert!(matches!(failed.result, OutcomeResult::Failed { .. }));
        assert!(
            store
                .events()
                .iter()
                .any(|e| e.event_type == DomainEventType::RevenueCycleOrchestrationFailed
                    && e.organization_id == Some(b))
        );
    }

    #[tokio::test]
    async fn test_concurrent_runs_do_work_once() {
        let store = Arc::new(InMemoryStore::new());
        let lock = Arc::new(InProcessLock::new());
        add_org(&store, "A");
        add_org(&store, "B");
        let gate = store.gate_directory();

        let orchestrator = orchestrator(&store, &lock);
        let (first, second) = tokio::join!(orchestrator.run(closing_day_noon()), async {
            let second = orchestrator.run(closing_day_noon()).await;
            gate.notify_one();
            second
        });

        let (first, second) = (first.unwrap(), second.unwrap());
        assert!(first.lock_acquired);
        assert_eq!(first.processed, 2);
        assert!(!second.lock_acquired);
        assert_eq!(second.processed, 0);
        assert_eq!(second.succeeded + second.failed + second.skipped, 0);
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let lock = Arc::new(InProcessLock::new());
        add_org(&store, "A");
        let orchestrator = orchestrator(&store, &lock);
        let not_closing_day = Utc.with_ymd_and_hms(2026, 4, 3, 12, 0, 0).unwrap();

        let first = orchestrator.run(not_closing_day).await.unwrap();
        let second = orchestrator.run(not_closing_day).await.unwrap();

        assert_eq!(first.outcomes[0].actions, vec![OrchestratorAction::CreatedCurrentCycle]);
        assert_eq!(second.outcomes[0].actions, vec![OrchestratorAction::CurrentCycleExists]);
        assert_eq!(second.skipped, 1);
        assert_eq!(store.cycle_count(), 1);
    }

    #[tokio::test]
    async fn test_closing_day_without_previous_cycle() {
        let store = Arc::new(InMemoryStore::new());
        let lock = Arc::new(InProcessLock::new());
        add_org(&store, "A");

        let summary = orchestrator(&store, &lock).run(closing_day_noon()).await.unwrap();

        assert_eq!(
            summary.outcomes[0].actions,
            vec![
                OrchestratorAction::CreatedCurrentCycle,
                OrchestratorAction::PreviousCycleMissing
            ]
        );
    }

    #[tokio::test]
    async fn test_lock_released_after_run() {
        let store = Arc::new(InMemoryStore::new());
        let lock = Arc::new(InProcessLock::new());
        add_org(&store, "A");

        orchestrator(&store, &lock).run(closing_day_noon()).await.unwrap();
        assert!(lock.try_acquire("revenue_cycle_orchestrator").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_event_sink_failure_does_not_fail_organization() {
        let store = Arc::new(InMemoryStore::new());
        let lock = Arc::new(InProcessLock::new());
        add_org(&store, "A");
        store.fail_events();

        let summary = orchestrator(&store, &lock).run(closing_day_noon()).await.unwrap();
        assert_eq!(summary.succeeded, 1);
        assert!(store.events().is_empty());
    }
}
