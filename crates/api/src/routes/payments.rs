//! Payment reconciliation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use sairex_core::payment::ReconcilePaymentInput;
use sairex_shared::Role;

/// Creates the payment routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/organizations/{org_id}/payments/reconcile",
        post(reconcile_payment),
    )
}

/// Request body for reconciling a payment.
#[derive(Debug, Deserialize)]
pub struct ReconcilePaymentRequest {
    /// Challan being paid.
    pub challan_id: Uuid,
    /// Amount paid.
    pub amount: Decimal,
    /// Business date (YYYY-MM-DD).
    pub payment_date: NaiveDate,
    /// Exact settlement time, if known.
    pub paid_at: Option<DateTime<Utc>>,
    /// Channel (e.g., "BANK", "CASH").
    pub payment_channel: String,
    /// Bank or gateway reference.
    pub reference_number: String,
    /// ISO 4217 code; organization default when omitted.
    pub currency: Option<String>,
    /// Gateway, if any.
    pub gateway: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
}

/// POST `/organizations/{org_id}/payments/reconcile` - Apply a payment to a challan.
async fn reconcile_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<ReconcilePaymentRequest>,
) -> ApiResult<impl IntoResponse> {
    auth.require_organization(org_id)?;
    auth.require_role(Role::can_reconcile_payments, "reconcile payments")?;

    if auth.claims().campus.is_some() {
        let challan = state.posting.get_challan(org_id, payload.challan_id).await?;
        auth.require_campus(challan.campus_id)?;
    }

    let result = state
        .reconciliation
        .reconcile(ReconcilePaymentInput {
            organization_id: org_id,
            challan_id: payload.challan_id,
            amount: payload.amount,
            payment_date: payload.payment_date,
            paid_at: payload.paid_at,
            payment_channel: payload.payment_channel,
            reference_number: payload.reference_number,
            currency: payload.currency,
            gateway: payload.gateway,
            notes: payload.notes,
            recorded_by: Some(auth.user_id()),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}
