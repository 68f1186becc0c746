//! Revenue cycle routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use sairex_core::revenue::{
    AdjustmentInput, AdjustmentOutcome, LiveMetrics, RevenueAdjustment, RevenueCycle,
};
use sairex_shared::Role;

/// Creates the revenue cycle routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/revenue-cycles",
            get(list_cycles).post(create_cycle),
        )
        .route("/organizations/{org_id}/revenue-cycles/{cycle_id}", get(get_cycle))
        .route(
            "/organizations/{org_id}/revenue-cycles/{cycle_id}/refresh",
            post(refresh_cycle),
        )
        .route(
            "/organizations/{org_id}/revenue-cycles/{cycle_id}/close",
            post(close_cycle),
        )
        .route(
            "/organizations/{org_id}/revenue-cycles/{cycle_id}/adjustments",
            get(list_adjustments).post(create_adjustment),
        )
}

/// Request body for creating a cycle on demand.
#[derive(Debug, Deserialize)]
pub struct CreateCycleRequest {
    /// Month (1-12).
    pub month: u32,
    /// Year.
    pub year: i32,
}

/// Request body for adjusting a closed cycle.
#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    /// Signed, non-zero amount added to the platform revenue.
    pub amount: Decimal,
    /// Why the adjustment was made.
    pub reason: String,
}

/// GET `/organizations/{org_id}/revenue-cycles` - List cycles, newest first.
async fn list_cycles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RevenueCycle>>> {
    auth.require_organization(org_id)?;
    Ok(Json(state.revenue_cycles.list_cycles(org_id).await?))
}

/// POST `/organizations/{org_id}/revenue-cycles` - Create a month's cycle if absent.
async fn create_cycle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CreateCycleRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require_organization(org_id)?;
    auth.require_role(Role::can_manage_revenue_cycles, "create revenue cycles")?;

    let creation = state
        .revenue_cycles
        .create_monthly_cycle(org_id, payload.month, payload.year)
        .await?;

    let status = if creation.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(creation)))
}

/// GET `/organizations/{org_id}/revenue-cycles/{cycle_id}` - One cycle.
async fn get_cycle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, cycle_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RevenueCycle>> {
    auth.require_organization(org_id)?;
    Ok(Json(state.revenue_cycles.get_cycle(org_id, cycle_id).await?))
}

/// POST `/organizations/{org_id}/revenue-cycles/{cycle_id}/refresh` - Recompute live metrics.
async fn refresh_cycle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, cycle_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<LiveMetrics>> {
    auth.require_organization(org_id)?;
    Ok(Json(state.revenue_cycles.refresh_cycle(org_id, cycle_id).await?))
}

/// POST `/organizations/{org_id}/revenue-cycles/{cycle_id}/close` - Close with final metrics.
async fn close_cycle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, cycle_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RevenueCycle>> {
    auth.require_organization(org_id)?;
    auth.require_role(Role::can_manage_revenue_cycles, "close revenue cycles")?;

    let cycle = state.revenue_cycles.close_cycle(org_id, cycle_id).await?;
    info!(
        organization_id = %org_id,
        cycle_id = %cycle_id,
        user_id = %auth.user_id(),
        "revenue cycle closed on request"
    );
    Ok(Json(cycle))
}

/// POST `/organizations/{org_id}/revenue-cycles/{cycle_id}/adjustments` - Adjust a closed cycle.
async fn create_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, cycle_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AdjustmentRequest>,
) -> ApiResult<(StatusCode, Json<AdjustmentOutcome>)> {
    auth.require_organization(org_id)?;
    auth.require_role(Role::can_manage_revenue_cycles, "adjust revenue cycles")?;

    let outcome = state
        .revenue_cycles
        .apply_adjustment(AdjustmentInput {
            organization_id: org_id,
            revenue_cycle_id: cycle_id,
            amount: payload.amount,
            reason: payload.reason,
            created_by: auth.user_id(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET `/organizations/{org_id}/revenue-cycles/{cycle_id}/adjustments` - Adjustment history.
async fn list_adjustments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, cycle_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Vec<RevenueAdjustment>>> {
    auth.require_organization(org_id)?;
    Ok(Json(
        state
            .revenue_cycles
            .list_adjustments(org_id, cycle_id)
            .await?,
    ))
}
