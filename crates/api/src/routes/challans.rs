//! Challan posting, listing, and cancellation routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use sairex_core::billing::{
    BillingPeriod, CancelChallanInput, ChallanFilter, ChallanStatus, FeeChallan, PostingReport,
    PostingRequest,
};
use sairex_core::payment::PaymentRecord;
use sairex_shared::{AppError, Role};
use sairex_shared::types::{PageRequest, PageResponse};

/// Creates the challan routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations/{org_id}/challans", get(list_challans))
        .route(
            "/organizations/{org_id}/challans/generate",
            post(generate_challans),
        )
        .route("/organizations/{org_id}/challans/{challan_id}", get(get_challan))
        .route(
            "/organizations/{org_id}/challans/{challan_id}/cancel",
            post(cancel_challan),
        )
}

/// Request body for generating challans.
#[derive(Debug, Deserialize)]
pub struct GenerateChallansRequest {
    /// Campus being billed.
    pub campus_id: Uuid,
    /// Grade being billed.
    pub grade: String,
    /// Billing period (YYYY-MM).
    pub billing_period: BillingPeriod,
    /// Issue date; today when omitted.
    pub issue_date: Option<NaiveDate>,
    /// Due date (YYYY-MM-DD).
    pub due_date: NaiveDate,
}

/// Query parameters for listing challans.
#[derive(Debug, Deserialize)]
pub struct ListChallansQuery {
    /// Filter by student.
    pub student_id: Option<Uuid>,
    /// Filter by status (UNPAID, PARTIALLY_PAID, PAID, CANCELLED).
    pub status: Option<String>,
    /// Filter by billing period (YYYY-MM).
    pub billing_period: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for cancelling a challan.
#[derive(Debug, Deserialize)]
pub struct CancelChallanRequest {
    /// Why the challan is withdrawn.
    pub reason: String,
}

/// A challan with its payment records.
#[derive(Debug, Serialize)]
pub struct ChallanDetailResponse {
    /// The challan.
    #[serde(flatten)]
    pub challan: FeeChallan,
    /// Payments recorded against it, oldest first.
    pub payments: Vec<PaymentRecord>,
}

/// POST `/organizations/{org_id}/challans/generate` - Bill every eligible student.
async fn generate_challans(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<GenerateChallansRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require_organization(org_id)?;
    auth.require_role(Role::can_post_challans, "post challans")?;
    auth.require_campus(payload.campus_id)?;

    let report: PostingReport = state
        .posting
        .generate_challans(PostingRequest {
            organization_id: org_id,
            campus_id: payload.campus_id,
            grade: payload.grade,
            billing_period: payload.billing_period,
            issue_date: payload.issue_date,
            due_date: payload.due_date,
            generated_by: Some(auth.user_id()),
        })
        .await?;

    info!(
        organization_id = %org_id,
        user_id = %auth.user_id(),
        generated = report.generated_count,
        skipped = report.skipped_existing,
        failed = report.failed.len(),
        "challan generation requested"
    );

    let status = if report.generated_count > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}

/// GET `/organizations/{org_id}/challans` - List challans, newest first.
async fn list_challans(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ListChallansQuery>,
) -> ApiResult<Json<PageResponse<FeeChallan>>> {
    auth.require_organization(org_id)?;

    let status = match query.status.as_deref() {
        Some(s) => Some(
            ChallanStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown challan status: {s}")))?,
        ),
        None => None,
    };

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let filter = ChallanFilter {
        student_id: query.student_id,
        status,
        billing_period: query.billing_period,
    };

    let challans = state.posting.list_challans(org_id, filter, page).await?;
    Ok(Json(challans))
}

/// GET `/organizations/{org_id}/challans/{challan_id}` - One challan with its payments.
async fn get_challan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, challan_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ChallanDetailResponse>> {
    auth.require_organization(org_id)?;

    let challan = state.posting.get_challan(org_id, challan_id).await?;
    let payments = state
        .reconciliation
        .payments_for_challan(org_id, challan_id)
        .await?;

    Ok(Json(ChallanDetailResponse { challan, payments }))
}

/// POST `/organizations/{org_id}/challans/{challan_id}/cancel` - Withdraw an unpaid challan.
async fn cancel_challan(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, challan_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CancelChallanRequest>,
) -> ApiResult<Json<FeeChallan>> {
    auth.require_organization(org_id)?;
    auth.require_role(Role::can_post_challans, "cancel challans")?;

    if auth.claims().campus.is_some() {
        let challan = state.posting.get_challan(org_id, challan_id).await?;
        auth.require_campus(challan.campus_id)?;
    }

    let challan = state
        .posting
        .cancel_challan(CancelChallanInput {
            organization_id: org_id,
            challan_id,
            reason: payload.reason,
            cancelled_by: auth.user_id(),
        })
        .await?;
    Ok(Json(challan))
}
