//! Student ledger routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use sairex_core::ledger::{LedgerService, LedgerStatement};

/// Creates the student routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/organizations/{org_id}/students/{student_id}/ledger",
        get(student_ledger),
    )
}

/// GET `/organizations/{org_id}/students/{student_id}/ledger` - Entries, summary, and drift check.
async fn student_ledger(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, student_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<LedgerStatement>> {
    auth.require_organization(org_id)?;

    let statement = LedgerService::load_statement(state.ledger.as_ref(), org_id, student_id).await?;
    Ok(Json(statement))
}
