//! Posting service: challan generation, lookup, and cancellation.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sairex_shared::types::{PageRequest, PageResponse};
use uuid::Uuid;

use super::error::BillingError;
use super::period::challan_number;
use super::store::BillingStore;
use super::types::{
    CancelChallanInput, ChallanFilter, ChallanInsert, FeeChallan, NewChallan, PostingFailure,
    PostingReport, PostingRequest,
};
use crate::fees::{FeeResolution, FeeResolver, FeeStructureStore};
use crate::ledger::LedgerService;
use crate::money;

/// Service for posting challans to a cohort of students.
pub struct PostingService<S> {
    store: Arc<S>,
}

impl<S> Clone for PostingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BillingStore + FeeStructureStore> PostingService<S> {
    /// Create a new posting service.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve the fee rules billed to a campus and grade.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn resolve_fees(
        &self,
        organization_id: Uuid,
        campus_id: Uuid,
        grade: &str,
    ) -> Result<FeeResolution, BillingError> {
        FeeResolver::load(self.store.as_ref(), organization_id, campus_id, grade).await
    }

    /// Generate one challan per eligible student, idempotently.
    ///
    /// Steps:
    /// 1. Load active students in scope; none is terminal
    /// 2. Resolve fee rules; none is terminal
    /// 3. Bill each student the sum of every matching rule
    /// 4. Skip students whose deterministic challan number already exists
    ///
    /// Per-student failures are collected into the report and never abort
    /// the batch.
    ///
    /// # Errors
    ///
    /// Returns `BillingError` for invalid dates, an empty scope, or a bill
    /// amount that is non-positive or does not fit the stored precision.
    pub async fn generate_challans(
        &self,
        request: PostingRequest,
    ) -> Result<PostingReport, BillingError> {
        let issue_date = request.issue_date.unwrap_or_else(|| Utc::now().date_naive());
        if request.due_date < issue_date {
            return Err(BillingError::InvalidDueDate {
                issue_date,
                due_date: request.due_date,
            });
        }

        // 1. Students in scope
        let students = self
            .store
            .active_students(request.organization_id, request.campus_id, &request.grade)
            .await?;
        if students.is_empty() {
            return Err(BillingError::NoStudents {
                campus_id: request.campus_id,
                grade: request.grade,
            });
        }

        // 2. Fee rules in scope
        let resolution = self
            .resolve_fees(request.organization_id, request.campus_id, &request.grade)
            .await?;
        if resolution.is_empty() {
            return Err(BillingError::NoFeeRules {
                campus_id: request.campus_id,
                grade: request.grade,
            });
        }
        if resolution.total_amount <= Decimal::ZERO
            || !money::fits_storage(resolution.total_amount)
        {
            return Err(BillingError::InvalidAmount(resolution.total_amount));
        }

        let mut report = PostingReport {
            generated_count: 0,
            students_found: students.len(),
            skipped_existing: 0,
            failed: Vec::new(),
            total_bill_amount: resolution.total_amount,
            challan_numbers: Vec::new(),
        };

        // 3-4. One unit of work per student
        for student in &students {
            let challan_no = challan_number(
                request.campus_id,
                student.id,
                request.billing_period,
                &resolution.rules,
            );

            let new_challan = NewChallan {
                id: Uuid::now_v7(),
                organization_id: request.organization_id,
                campus_id: request.campus_id,
                student_id: student.id,
                challan_no: challan_no.clone(),
                billing_period: request.billing_period,
                issue_date,
                due_date: request.due_date,
                total_amount: resolution.total_amount,
                generated_by: request.generated_by,
            };

            match self.post_one(new_challan).await {
                Ok(true) => {
                    report.generated_count += 1;
                    report.challan_numbers.push(challan_no);
                }
                Ok(false) => report.skipped_existing += 1,
                Err(err) => {
                    tracing::warn!(
                        organization_id = %request.organization_id,
                        student_id = %student.id,
                        challan_no = %challan_no,
                        error = %err,
                        "challan posting failed for student"
                    );
                    report.failed.push(PostingFailure {
                        student_id: student.id,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            organization_id = %request.organization_id,
            campus_id = %request.campus_id,
            grade = %request.grade,
            billing_period = %request.billing_period,
            students_found = report.students_found,
            generated = report.generated_count,
            skipped = report.skipped_existing,
            failed = report.failed.len(),
            "challan posting completed"
        );

        Ok(report)
    }

    /// Writes one challan; `Ok(false)` when it already existed.
    async fn post_one(&self, new_challan: NewChallan) -> Result<bool, BillingError> {
        if self
            .store
            .find_challan_by_number(new_challan.organization_id, &new_challan.challan_no)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let debit = LedgerService::challan_debit(&new_challan.clone().into_challan(Utc::now()));
        match self.store.insert_challan(new_challan, debit).await? {
            ChallanInsert::Created(_) => Ok(true),
            ChallanInsert::AlreadyExists => Ok(false),
        }
    }

    /// Fetch one challan.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::ChallanNotFound` if absent or in another organization.
    pub async fn get_challan(
        &self,
        organization_id: Uuid,
        challan_id: Uuid,
    ) -> Result<FeeChallan, BillingError> {
        self.store
            .find_challan(organization_id, challan_id)
            .await?
            .ok_or(BillingError::ChallanNotFound(challan_id))
    }

    /// List challans, newest first.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_challans(
        &self,
        organization_id: Uuid,
        filter: ChallanFilter,
        page: PageRequest,
    ) -> Result<PageResponse<FeeChallan>, BillingError> {
        let page = page.normalized();
        let (items, total) = self
            .store
            .list_challans(organization_id, filter, page.clone())
            .await?;
        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    /// Cancel an unpaid challan and waive its amount.
    ///
    /// # Errors
    ///
    /// Returns `BillingError` if the reason is blank, the challan is missing,
    /// or it has already collected money.
    pub async fn cancel_challan(
        &self,
        input: CancelChallanInput,
    ) -> Result<FeeChallan, BillingError> {
        if input.reason.trim().is_empty() {
            return Err(BillingError::MissingField("reason"));
        }

        let organization_id = input.organization_id;
        let cancelled_by = input.cancelled_by;
        let challan = self.store.cancel_challan(input, Utc::now()).await?;

        tracing::info!(
            organization_id = %organization_id,
            challan_id = %challan.id,
            cancelled_by = %cancelled_by,
            amount = %challan.total_amount,
            "challan cancelled"
        );
        Ok(challan)
    }
}
