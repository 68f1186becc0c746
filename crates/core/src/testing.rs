//! In-memory store used by unit tests.
//!
//! Implements every store trait over one mutex-guarded state and applies the
//! same plan functions the database repositories use, so multi-entity writes
//! commit or roll back together.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sairex_shared::types::PageRequest;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::billing::{
    BillingError, BillingPeriod, BillingStore, CancelChallanInput, ChallanFilter, ChallanInsert,
    ChallanLifecycle, ChallanStatus, FeeChallan, NewChallan, Student,
};
use crate::events::{DomainEvent, EventSink, EventSinkError};
use crate::fees::{FeeResolver, FeeRule, FeeStructureStore};
use crate::ledger::{
    LedgerEntry, LedgerService, LedgerStore, NewLedgerEntry, StudentFinancialSummary,
};
use crate::orchestrator::{OrchestratorError, OrganizationDirectory, OrganizationSchedule};
use crate::payment::{
    PaymentRecord, PaymentStatus, PaymentStore, ReconcilePaymentInput, ReconciliationResult,
    ReconciliationService,
};
use crate::revenue::{
    AdjustmentInput, AdjustmentOutcome, BillingPlan, CycleClosure, CycleInsert, CycleWindow,
    NewRevenueCycle, RevenueAdjustment, RevenueCalculationMode, RevenueCycle, RevenueCycleError,
    RevenueCycleLifecycle, RevenueCycleMetrics, RevenueCycleStore,
};

/// Unpaid challan with fresh IDs, not stored anywhere.
pub fn sample_challan(total_amount: Decimal) -> FeeChallan {
    NewChallan {
        id: Uuid::now_v7(),
        organization_id: Uuid::new_v4(),
        campus_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        challan_no: format!("CH-202603-{}", &Uuid::new_v4().simple().to_string()[..16]),
        billing_period: BillingPeriod::new(2026, 3).unwrap(),
        issue_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        total_amount,
        generated_by: None,
    }
    .into_challan(Utc::now())
}

struct Organization {
    id: Uuid,
    name: String,
    timezone: Option<String>,
}

#[derive(Default)]
struct State {
    organizations: Vec<Organization>,
    plans: HashMap<Uuid, BillingPlan>,
    students: Vec<Student>,
    fee_rules: Vec<FeeRule>,
    challans: Vec<FeeChallan>,
    entries: Vec<LedgerEntry>,
    summaries: HashMap<(Uuid, Uuid), StudentFinancialSummary>,
    payments: Vec<PaymentRecord>,
    cycles: Vec<RevenueCycle>,
    adjustments: Vec<RevenueAdjustment>,
    events: Vec<DomainEvent>,
    failing_students: HashSet<Uuid>,
    failing_cycle_orgs: HashSet<Uuid>,
    fail_events: bool,
    directory_gate: Option<Arc<Notify>>,
}

impl State {
    /// Appends an entry and folds it into the student's summary.
    fn post_entry(&mut self, entry: NewLedgerEntry, now: DateTime<Utc>) -> Result<LedgerEntry, BillingError> {
        let key = (entry.organization_id, entry.student_id);
        let mut summary = self
            .summaries
            .get(&key)
            .cloned()
            .unwrap_or_else(|| StudentFinancialSummary::empty(entry.organization_id, entry.student_id));
        summary.apply(&entry)?;

        let entry = entry.into_entry(now);
        self.summaries.insert(key, summary);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn challan_mut(&mut self, organization_id: Uuid, challan_id: Uuid) -> Option<&mut FeeChallan> {
        self.challans
            .iter_mut()
            .find(|c| c.id == challan_id && c.organization_id == organization_id)
    }

    fn cycle_mut(&mut self, organization_id: Uuid, cycle_id: Uuid) -> Option<&mut RevenueCycle> {
        self.cycles
            .iter_mut()
            .find(|c| c.id == cycle_id && c.organization_id == organization_id)
    }
}

/// Test double for every store trait in this crate.
pub struct InMemoryStore {
    /// Organization used by the single-tenant helpers.
    pub organization_id: Uuid,
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            organization_id: Uuid::new_v4(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    // ========== Seeding ==========

    /// Adds `count` active students to the default organization.
    pub fn add_students(&self, campus_id: Uuid, grade: &str, count: usize) -> Vec<Uuid> {
        let mut state = self.state();
        (0..count)
            .map(|i| {
                let id = Uuid::now_v7();
                state.students.push(Student {
                    id,
                    organization_id: self.organization_id,
                    campus_id,
                    grade: grade.to_string(),
                    full_name: format!("Student {i}"),
                });
                id
            })
            .collect()
    }

    /// Adds an active fee rule to the default organization.
    pub fn add_fee_rule(&self, campus_id: Uuid, grade: Option<&str>, amount: Decimal) -> Uuid {
        let id = Uuid::now_v7();
        self.state().fee_rules.push(FeeRule {
            id,
            organization_id: self.organization_id,
            campus_id,
            name: format!("Fee {amount}"),
            amount,
            applicable_grade: grade.map(str::to_string),
            is_active: true,
        });
        id
    }

    /// Registers an organization visible to the orchestrator.
    ///
    /// The default organization is not listed unless added here.
    pub fn add_organization(&self, name: &str, timezone: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.state().organizations.push(Organization {
            id,
            name: name.to_string(),
            timezone: timezone.map(str::to_string),
        });
        id
    }

    /// Sets (or replaces) an organization's billing plan.
    pub fn set_billing_plan(
        &self,
        organization_id: Uuid,
        mode: RevenueCalculationMode,
        per_student_fee: Decimal,
        closing_day: Option<i32>,
    ) {
        self.state().plans.insert(
            organization_id,
            BillingPlan {
                organization_id,
                revenue_calculation_mode: mode,
                per_student_fee,
                closing_day,
            },
        );
    }

    /// Stores a posted challan (challan, debit, summary) for a new student.
    pub fn seed_posted_challan(&self, total_amount: Decimal) -> FeeChallan {
        let mut challan = sample_challan(total_amount);
        challan.organization_id = self.organization_id;
        self.store_posted(challan)
    }

    /// Like `seed_posted_challan`, issued on `issue_date`.
    pub fn seed_challan_issued(&self, total_amount: Decimal, issue_date: NaiveDate) -> FeeChallan {
        let mut challan = sample_challan(total_amount);
        challan.organization_id = self.organization_id;
        challan.issue_date = issue_date;
        challan.due_date = issue_date;
        self.store_posted(challan)
    }

    fn store_posted(&self, challan: FeeChallan) -> FeeChallan {
        let mut state = self.state();
        let debit = LedgerService::challan_debit(&challan);
        state.post_entry(debit, challan.created_at).unwrap();
        state.challans.push(challan.clone());
        challan
    }

    /// Reconciles a payment dated `payment_date` directly.
    pub fn seed_reconciled_payment(
        &self,
        challan: &FeeChallan,
        amount: Decimal,
        payment_date: NaiveDate,
    ) -> ReconciliationResult {
        let input = ReconcilePaymentInput {
            organization_id: challan.organization_id,
            challan_id: challan.id,
            amount,
            payment_date,
            paid_at: None,
            payment_channel: "CASH".into(),
            reference_number: Uuid::new_v4().to_string(),
            currency: None,
            gateway: None,
            notes: None,
            recorded_by: None,
        };
        self.reconcile_locked(&input, "PKR", Utc::now()).unwrap()
    }

    /// Overwrites a stored challan.
    pub fn replace_challan(&self, challan: FeeChallan) {
        let mut state = self.state();
        if let Some(slot) = state.challans.iter_mut().find(|c| c.id == challan.id) {
            *slot = challan;
        }
    }

    /// Flags a stored challan as cancelled without a waiver entry.
    pub fn mark_cancelled(&self, challan_id: Uuid) {
        let mut state = self.state();
        if let Some(challan) = state.challans.iter_mut().find(|c| c.id == challan_id) {
            challan.status = ChallanStatus::Cancelled;
        }
    }

    // ========== Failure injection ==========

    pub fn fail_challan_insert_for(&self, student_id: Uuid) {
        self.state().failing_students.insert(student_id);
    }

    pub fn fail_cycle_creation_for(&self, organization_id: Uuid) {
        self.state().failing_cycle_orgs.insert(organization_id);
    }

    pub fn fail_events(&self) {
        self.state().fail_events = true;
    }

    /// Makes the next organization listing wait until the returned gate is notified.
    pub fn gate_directory(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().directory_gate = Some(Arc::clone(&gate));
        gate
    }

    // ========== Inspection ==========

    pub fn challans(&self) -> Vec<FeeChallan> {
        self.state().challans.clone()
    }

    pub fn challan(&self, challan_id: Uuid) -> FeeChallan {
        self.state()
            .challans
            .iter()
            .find(|c| c.id == challan_id)
            .cloned()
            .unwrap()
    }

    pub fn ledger_entry_count(&self) -> usize {
        self.state().entries.len()
    }

    pub fn cycle_count(&self) -> usize {
        self.state().cycles.len()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.state().events.clone()
    }

    /// Reconciliation as one critical section, mirroring the database transaction.
    fn reconcile_locked(
        &self,
        input: &ReconcilePaymentInput,
        default_currency: &str,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationResult, BillingError> {
        let mut state = self.state();
        let challan = state
            .challans
            .iter()
            .find(|c| c.id == input.challan_id && c.organization_id == input.organization_id)
            .cloned()
            .ok_or(BillingError::ChallanNotFound(input.challan_id))?;

        let key = input.natural_key();
        let duplicate = state.payments.iter().any(|p| key.matches(p));

        let plan = ReconciliationService::<Self>::plan(&challan, input, duplicate, default_currency, now)?;
        let result = plan.result();

        state.post_entry(plan.credit, now)?;
        state.payments.push(plan.payment);
        if let Some(slot) = state.challan_mut(challan.organization_id, challan.id) {
            *slot = plan.challan;
        }
        Ok(result)
    }
}

impl FeeStructureStore for InMemoryStore {
    async fn active_fee_rules(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
    ) -> Result<Vec<FeeRule>, BillingError> {
        Ok(self
            .state()
            .fee_rules
            .iter()
            .filter(|r| r.organization_id == organization_id && r.campus_id == campus_id && r.is_active)
            .cloned()
            .collect())
    }
}

impl BillingStore for InMemoryStore {
    async fn active_students(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
        grade: &str,
    ) -> Result<Vec<Student>, BillingError> {
        Ok(self
            .state()
            .students
            .iter()
            .filter(|s| {
                s.organization_id == organization_id
                    && s.campus_id == campus_id
                    && FeeResolver::same_grade(&s.grade, grade)
            })
            .cloned()
            .collect())
    }

    async fn find_challan_by_number(
        &self,
        organization_id: Uuid,
        challan_no: &str,
    ) -> Result<Option<FeeChallan>, BillingError> {
        Ok(self
            .state()
            .challans
            .iter()
            .find(|c| c.organization_id == organization_id && c.challan_no == challan_no)
            .cloned())
    }

    async fn insert_challan(
        &self,
        challan: NewChallan,
        debit: NewLedgerEntry,
    ) -> Result<ChallanInsert, BillingError> {
        let mut state = self.state();
        if state.failing_students.contains(&challan.student_id) {
            return Err(BillingError::Database("injected insert failure".into()));
        }
        if state.challans.iter().any(|c| c.challan_no == challan.challan_no) {
            return Ok(ChallanInsert::AlreadyExists);
        }

        let now = Utc::now();
        let challan = challan.into_challan(now);
        state.post_entry(debit, now)?;
        state.challans.push(challan.clone());
        Ok(ChallanInsert::Created(challan))
    }

    async fn find_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> Result<Option<FeeChallan>, BillingError> {
        Ok(self.state().challan_mut(organization_id, challan_id).cloned())
    }

    async fn list_challans(
        &self,
        organization_id: Uuid,
        filter: ChallanFilter,
        page: PageRequest,
    ) -> Result<(Vec<FeeChallan>, u64), BillingError> {
        let state = self.state();
        let mut matching: Vec<FeeChallan> = state
            .challans
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .filter(|c| filter.student_id.is_none_or(|s| c.student_id == s))
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .filter(|c| filter.billing_period.as_ref().is_none_or(|p| &c.billing_period == p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap())
            .take(usize::try_from(page.limit()).unwrap())
            .collect();
        Ok((items, total))
    }

    async fn cancel_challan(
        &self,
        input: CancelChallanInput,
        now: DateTime<Utc>,
    ) -> Result<FeeChallan, BillingError> {
        let mut state = self.state();
        let challan = state
            .challan_mut(input.organization_id, input.challan_id)
            .cloned()
            .ok_or(BillingError::ChallanNotFound(input.challan_id))?;

        let plan = ChallanLifecycle::plan_cancellation(&challan, &input.reason, now)?;
        state.post_entry(plan.waiver, now)?;
        if let Some(slot) = state.challan_mut(input.organization_id, input.challan_id) {
            *slot = plan.challan.clone();
        }
        Ok(plan.challan)
    }
}

impl LedgerStore for InMemoryStore {
    async fn student_entries(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, BillingError> {
        Ok(self
            .state()
            .entries
            .iter()
            .filter(|e| e.organization_id == organization_id && e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn student_summary(
        &self,
        organization_id: Uuid,
        student_id: Uuid,
    ) -> Result<Option<StudentFinancialSummary>, BillingError> {
        Ok(self.state().summaries.get(&(organization_id, student_id)).cloned())
    }
}

impl PaymentStore for InMemoryStore {
    async fn reconcile_payment(
        &self,
        input: ReconcilePaymentInput,
        default_currency: String,
        now: DateTime<Utc>,
    ) -> Result<ReconciliationResult, BillingError> {
        self.reconcile_locked(&input, &default_currency, now)
    }

    async fn payments_for_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> Result<Vec<PaymentRecord>, BillingError> {
        Ok(self
            .state()
            .payments
            .iter()
            .filter(|p| p.organization_id == organization_id && p.challan_id == challan_id)
            .cloned()
            .collect())
    }
}

impl RevenueCycleStore for InMemoryStore {
    async fn billing_plan(&self, organization_id: Uuid) -> Result<Option<BillingPlan>, RevenueCycleError> {
        Ok(self.state().plans.get(&organization_id).cloned())
    }

    async fn insert_cycle(&self, cycle: NewRevenueCycle) -> Result<CycleInsert, RevenueCycleError> {
        let mut state = self.state();
        if state.failing_cycle_orgs.contains(&cycle.organization_id) {
            return Err(RevenueCycleError::Database("injected cycle failure".into()));
        }
        if let Some(existing) = state.cycles.iter().find(|c| {
            c.organization_id == cycle.organization_id && c.month == cycle.month && c.year == cycle.year
        }) {
            return Ok(CycleInsert::AlreadyExists(existing.clone()));
        }

        let cycle = cycle.into_cycle(Utc::now());
        state.cycles.push(cycle.clone());
        Ok(CycleInsert::Created(cycle))
    }

    async fn find_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        Ok(self.state().cycle_mut(organization_id, cycle_id).cloned())
    }

    async fn find_cycle_for_period(
        &self,
        organization_id: Uuid,
        month: u32,
        year: i32,
    ) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        Ok(self
            .state()
            .cycles
            .iter()
            .find(|c| c.organization_id == organization_id && c.month == month && c.year == year)
            .cloned())
    }

    async fn list_cycles(&self, organization_id: Uuid) -> Result<Vec<RevenueCycle>, RevenueCycleError> {
        let mut cycles: Vec<RevenueCycle> = self
            .state()
            .cycles
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .cloned()
            .collect();
        cycles.sort_by(|a, b| (b.year, b.month).cmp(&(a.year, a.month)));
        Ok(cycles)
    }

    async fn period_metrics(
        &self,
        organization_id: Uuid,
        window: CycleWindow,
        mode: RevenueCalculationMode,
    ) -> Result<RevenueCycleMetrics, RevenueCycleError> {
        let state = self.state();

        let generated: Vec<&FeeChallan> = state
            .challans
            .iter()
            .filter(|c| c.organization_id == organization_id)
            .filter(|c| c.status != ChallanStatus::Cancelled && window.contains_date(c.issue_date))
            .collect();
        let collected: Vec<&PaymentRecord> = state
            .payments
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .filter(|p| p.status == PaymentStatus::Reconciled && window.contains(p.paid_at))
            .collect();

        let students: HashSet<Uuid> = match mode {
            RevenueCalculationMode::OnGeneratedFee => generated.iter().map(|c| c.student_id).collect(),
            RevenueCalculationMode::OnCollectedFee => collected
                .iter()
                .filter_map(|p| state.challans.iter().find(|c| c.id == p.challan_id))
                .map(|c| c.student_id)
                .collect(),
        };

        Ok(RevenueCycleMetrics {
            total_students: i64::try_from(students.len()).unwrap(),
            generated_amount: generated.iter().map(|c| c.total_amount).sum(),
            collected_amount: collected.iter().map(|p| p.amount).sum(),
        })
    }

    async fn save_open_metrics(&self, cycle: RevenueCycle) -> Result<Option<RevenueCycle>, RevenueCycleError> {
        let mut state = self.state();
        match state.cycle_mut(cycle.organization_id, cycle.id) {
            Some(slot) if !slot.is_closed() => {
                *slot = cycle.clone();
                Ok(Some(cycle))
            }
            _ => Ok(None),
        }
    }

    async fn close_cycle(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
        closure: CycleClosure,
    ) -> Result<RevenueCycle, RevenueCycleError> {
        let mut state = self.state();
        let slot = state
            .cycle_mut(organization_id, cycle_id)
            .ok_or(RevenueCycleError::CycleNotFound(cycle_id))?;
        let closed = RevenueCycleLifecycle::apply_close(slot, &closure)?;
        *slot = closed.clone();
        Ok(closed)
    }

    async fn apply_adjustment(&self, input: AdjustmentInput) -> Result<AdjustmentOutcome, RevenueCycleError> {
        let mut state = self.state();
        let cycle = state
            .cycle_mut(input.organization_id, input.revenue_cycle_id)
            .cloned()
            .ok_or(RevenueCycleError::CycleNotFound(input.revenue_cycle_id))?;

        let (adjustment, adjusted) = RevenueCycleLifecycle::plan_adjustment(&cycle, &input, Utc::now())?;
        state.adjustments.push(adjustment.clone());
        if let Some(slot) = state.cycle_mut(input.organization_id, input.revenue_cycle_id) {
            *slot = adjusted.clone();
        }
        Ok(AdjustmentOutcome {
            adjustment,
            cycle: adjusted,
        })
    }

    async fn list_adjustments(
        &self,
        organization_id: Uuid,
        cycle_id: Uuid,
    ) -> Result<Vec<RevenueAdjustment>, RevenueCycleError> {
        Ok(self
            .state()
            .adjustments
            .iter()
            .filter(|a| a.organization_id == organization_id && a.revenue_cycle_id == cycle_id)
            .cloned()
            .collect())
    }
}

impl OrganizationDirectory for InMemoryStore {
    async fn active_organizations(&self) -> Result<Vec<OrganizationSchedule>, OrchestratorError> {
        let gate = self.state().directory_gate.take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state();
        Ok(state
            .organizations
            .iter()
            .map(|org| OrganizationSchedule {
                organization_id: org.id,
                name: org.name.clone(),
                timezone: org.timezone.clone(),
                closing_day: state.plans.get(&org.id).and_then(|p| p.closing_day),
            })
            .collect())
    }
}

impl EventSink for InMemoryStore {
    async fn record(&self, event: DomainEvent) -> Result<(), EventSinkError> {
        let mut state = self.state();
        if state.fail_events {
            return Err(EventSinkError("injected sink failure".into()));
        }
        state.events.push(event);
        Ok(())
    }
}
