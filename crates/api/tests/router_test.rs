//! Router tests for authentication and scope rejection.
//!
//! Every request here is answered before any query runs, so the state is
//! built over a disconnected pool.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use rstest::rstest;
use sairex_api::{AppState, create_router};
use sairex_shared::config::{
    AppConfig, BillingConfig, DatabaseConfig, JwtConfig, LogConfig, OrchestratorConfig,
    ServerConfig,
};
use sairex_shared::{JwtService, Role};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: "router-test-secret-at-least-32-bytes!".to_string(),
            access_token_expiry_secs: 300,
        },
        billing: BillingConfig::default(),
        orchestrator: OrchestratorConfig::default(),
        log: LogConfig::default(),
    }
}

fn app() -> (Router, JwtService) {
    let config = test_config();
    let state = AppState::new(DatabaseConnection::Disconnected, &config);
    (create_router(state), JwtService::new(&config.jwt))
}

fn token(jwt: &JwtService, org: Uuid, campus: Option<Uuid>, role: Role) -> String {
    jwt.generate_access_token(Uuid::now_v7(), org, campus, role)
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, bearer: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {bearer}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app();
    let request = Request::builder()
        .uri("/api/v1/health")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_rejected() {
    let (app, _) = app();
    let request = Request::builder()
        .uri(format!("/api/v1/organizations/{}/challans", Uuid::now_v7()))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let (app, _) = app();
    let request = Request::builder()
        .uri(format!("/api/v1/organizations/{}/challans", Uuid::now_v7()))
        .header(AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_other_organization_is_forbidden() {
    let (app, jwt) = app();
    let bearer = token(&jwt, Uuid::now_v7(), None, Role::Owner);
    let request = Request::builder()
        .uri(format!("/api/v1/organizations/{}/revenue-cycles", Uuid::now_v7()))
        .header(AUTHORIZATION, format!("Bearer {bearer}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[rstest]
#[case(Role::Viewer)]
#[case(Role::Cashier)]
#[tokio::test]
async fn test_posting_requires_billing_role(#[case] role: Role) {
    let (app, jwt) = app();
    let org = Uuid::now_v7();
    let bearer = token(&jwt, org, None, role);
    let body = serde_json::json!({
        "campus_id": Uuid::now_v7(),
        "grade": "5",
        "billing_period": "2030-03",
        "due_date": "2030-03-15"
    });

    let (status, _) = send(
        app,
        post_json(&format!("/api/v1/organizations/{org}/challans/generate"), &bearer, &body),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_campus_scoped_principal_cannot_post_elsewhere() {
    let (app, jwt) = app();
    let org = Uuid::now_v7();
    let bearer = token(&jwt, org, Some(Uuid::now_v7()), Role::Accountant);
    let body = serde_json::json!({
        "campus_id": Uuid::now_v7(),
        "grade": "5",
        "billing_period": "2030-03",
        "due_date": "2030-03-15"
    });

    let (status, body) = send(
        app,
        post_json(&format!("/api/v1/organizations/{org}/challans/generate"), &bearer, &body),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("campus"));
}

#[tokio::test]
async fn test_close_requires_cycle_manager() {
    let (app, jwt) = app();
    let org = Uuid::now_v7();
    let bearer = token(&jwt, org, None, Role::Accountant);

    let (status, _) = send(
        app,
        post_json(
            &format!("/api/v1/organizations/{org}/revenue-cycles/{}/close", Uuid::now_v7()),
            &bearer,
            &Value::Null,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_orchestrate_requires_platform_admin() {
    let (app, jwt) = app();
    let bearer = token(&jwt, Uuid::now_v7(), None, Role::Owner);

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/admin/revenue-cycles/orchestrate")
        .header(AUTHORIZATION, format!("Bearer {bearer}"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}
