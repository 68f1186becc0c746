//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth_middleware};

pub mod admin;
pub mod challans;
pub mod fees;
pub mod health;
pub mod payments;
pub mod revenue_cycles;
pub mod students;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(fees::routes())
        .merge(challans::routes())
        .merge(payments::routes())
        .merge(students::routes())
        .merge(revenue_cycles::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(protected_routes)
}
