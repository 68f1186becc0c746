//! Platform administration routes.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use tracing::info;

use crate::{AppState, error::ApiResult, middleware::AuthUser};
use sairex_core::orchestrator::OrchestratorSummary;
use sairex_shared::Role;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/revenue-cycles/orchestrate", post(run_orchestrator))
}

/// POST `/admin/revenue-cycles/orchestrate` - Run the revenue cycle orchestrator now.
async fn run_orchestrator(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<OrchestratorSummary>> {
    auth.require_role(Role::is_platform_admin, "run the orchestrator")?;

    info!(user_id = %auth.user_id(), "orchestrator run requested");
    let summary = state.orchestrator.run(Utc::now()).await?;
    Ok(Json(summary))
}
