//! JSON error responses for route handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use sairex_core::billing::BillingError;
use sairex_core::orchestrator::OrchestratorError;
use sairex_core::revenue::RevenueCycleError;
use sairex_shared::AppError;

/// Errors a handler can return.
///
/// Renders as `{"error": CODE, "message": text}` with the status the
/// underlying error declares. Server-side failures are logged and their
/// details withheld from the client.
#[derive(Debug)]
pub enum ApiError {
    /// Scope or request validation failure.
    App(AppError),
    /// Fee, posting, ledger, or reconciliation failure.
    Billing(BillingError),
    /// Revenue cycle failure.
    RevenueCycle(RevenueCycleError),
    /// Orchestrator run failure.
    Orchestrator(OrchestratorError),
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self::App(err)
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        Self::Billing(err)
    }
}

impl From<RevenueCycleError> for ApiError {
    fn from(err: RevenueCycleError) -> Self {
        Self::RevenueCycle(err)
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        Self::Orchestrator(err)
    }
}

impl ApiError {
    /// HTTP status, stable error code, and message.
    fn parts(&self) -> (u16, &'static str, String) {
        match self {
            Self::App(e) => (e.status_code(), e.error_code(), e.to_string()),
            Self::Billing(e) => (e.http_status_code(), e.error_code(), e.to_string()),
            Self::RevenueCycle(e) => (e.http_status_code(), e.error_code(), e.to_string()),
            Self::Orchestrator(e) => (500, e.error_code(), e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if status.is_server_error() {
            error!(error = %message, code, "request failed");
            "An error occurred".to_string()
        } else {
            message
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Handler result type.
pub type ApiResult<T> = Result<T, ApiError>;
