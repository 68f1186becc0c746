//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for billing, payments, ledgers, and revenue cycles
//! - Authentication middleware and tenant scoping
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sairex_core::billing::PostingService;
use sairex_core::orchestrator::{Orchestrator, OrchestratorSettings};
use sairex_core::payment::ReconciliationService;
use sairex_core::revenue::RevenueCycleService;
use sairex_db::{
    BillingRepository, DomainEventRepository, OrganizationRepository, PaymentRepository,
    PgAdvisoryLock, RevenueCycleRepository,
};
use sairex_shared::{AppConfig, JwtService};

/// Orchestrator wired to the PostgreSQL repositories.
pub type RevenueOrchestrator = Orchestrator<
    OrganizationRepository,
    RevenueCycleRepository,
    PgAdvisoryLock,
    DomainEventRepository,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Fee resolution and challan posting.
    pub posting: PostingService<BillingRepository>,
    /// Payment reconciliation.
    pub reconciliation: ReconciliationService<PaymentRepository>,
    /// Student ledger reads.
    pub ledger: Arc<BillingRepository>,
    /// Revenue cycle lifecycle.
    pub revenue_cycles: RevenueCycleService<RevenueCycleRepository>,
    /// Scheduled revenue cycle run, also triggered over HTTP.
    pub orchestrator: Arc<RevenueOrchestrator>,
}

impl AppState {
    /// Builds the services over one connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        let billing = Arc::new(BillingRepository::new(db.clone()));
        let cycles = Arc::new(RevenueCycleRepository::new(db.clone()));
        let revenue_cycles =
            RevenueCycleService::new(cycles, config.orchestrator.default_closing_day);

        let orchestrator = Orchestrator::new(
            Arc::new(OrganizationRepository::new(db.clone())),
            revenue_cycles.clone(),
            Arc::new(PgAdvisoryLock::new(db.clone())),
            Arc::new(DomainEventRepository::new(db.clone())),
            OrchestratorSettings::from(&config.orchestrator),
        );

        Self {
            jwt_service: Arc::new(JwtService::new(&config.jwt)),
            posting: PostingService::new(Arc::clone(&billing)),
            reconciliation: ReconciliationService::new(
                Arc::new(PaymentRepository::new(db)),
                config.billing.default_currency.clone(),
            ),
            ledger: billing,
            revenue_cycles,
            orchestrator: Arc::new(orchestrator),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
