//! Authentication middleware and tenant scope checks for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use sairex_shared::{AppError, Claims, JwtError, Role};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token using the JWT service
/// 3. Stores the claims in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "MISSING_TOKEN",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            let (error, message) = match e {
                JwtError::Expired => ("TOKEN_EXPIRED", "Token has expired"),
                _ => ("INVALID_TOKEN", "Invalid or malformed token"),
            };

            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": error, "message": message })),
            )
                .into_response()
        }
    }
}

/// Extractor for authenticated principal claims.
///
/// ```ignore
/// async fn handler(auth: AuthUser, Path(org_id): Path<Uuid>) -> ApiResult<Json<()>> {
///     auth.require_organization(org_id)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub fn user_id(&self) -> Uuid {
        self.0.user_id()
    }

    /// Returns the organization ID from the claims.
    #[must_use]
    pub fn organization_id(&self) -> Uuid {
        self.0.organization_id()
    }

    /// Returns the principal's role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.0.role
    }

    /// Returns the inner claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.0
    }

    /// Rejects principals outside `org_id`. Platform admins pass.
    pub fn require_organization(&self, org_id: Uuid) -> Result<(), AppError> {
        if self.0.can_access_organization(org_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "principal cannot act on organization {org_id}"
            )))
        }
    }

    /// Rejects campus-restricted principals acting on another campus.
    pub fn require_campus(&self, campus_id: Uuid) -> Result<(), AppError> {
        if self.0.can_access_campus(campus_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "principal cannot act on campus {campus_id}"
            )))
        }
    }

    /// Rejects roles for which `allowed` is false.
    pub fn require_role(&self, allowed: fn(Role) -> bool, action: &str) -> Result<(), AppError> {
        if allowed(self.0.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "role {} cannot {action}",
                self.0.role
            )))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "UNAUTHORIZED",
                        "message": "Authentication required"
                    })),
                )
            })
    }
}
