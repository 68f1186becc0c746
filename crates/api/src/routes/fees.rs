//! Fee structure resolution routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use sairex_core::fees::FeeResolution;

/// Creates the fee structure routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/organizations/{org_id}/fee-structures/resolve",
        get(resolve_fees),
    )
}

/// Query parameters for fee resolution.
#[derive(Debug, Deserialize)]
pub struct ResolveFeesQuery {
    /// Campus being billed.
    pub campus_id: Uuid,
    /// Grade being billed.
    pub grade: String,
}

/// GET `/organizations/{org_id}/fee-structures/resolve` - Rules billed to a campus and grade.
async fn resolve_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ResolveFeesQuery>,
) -> ApiResult<Json<FeeResolution>> {
    auth.require_organization(org_id)?;
    auth.require_campus(query.campus_id)?;

    let resolution = state
        .posting
        .resolve_fees(org_id, query.campus_id, &query.grade)
        .await?;
    Ok(Json(resolution))
}
