// ABOUTME: End-to-end tests for the assembled server router
// ABOUTME: Admin token enforcement, form rate limiting and response headers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use porchlight_api::AppState;
use porchlight_cli::{
    build_router,
    middleware::{RateLimitConfig, ADMIN_TOKEN_HEADER},
    Config,
};
use porchlight_integrations::{Integrations, IntegrationsConfig};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const TOKEN: &str = "test-admin-token";

fn test_config(database: &TempDir) -> Config {
    Config {
        port: 4010,
        database_path: database.path().join("porchlight.db"),
        cors_origin: "http://localhost:5173".to_string(),
        public_base_url: None,
        admin_token: Some(TOKEN.to_string()),
        dev_mode: false,
        enable_hsts: false,
        rate_limit: RateLimitConfig::default(),
        integrations: IntegrationsConfig::default(),
    }
}

async fn app(config: &Config) -> Router {
    let pool = porchlight_storage::connect(&config.database_path)
        .await
        .unwrap();
    let state = AppState::new(pool, Integrations::disabled(), None);
    build_router(state, config).unwrap()
}

fn contact_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/forms/contact")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "name": "Sam Ortiz",
                "email": "sam@example.com",
                "message": "Our sale date was just posted."
            })
            .to_string(),
        ))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_admin_routes_require_token() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let app = app(&config).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/dashboard")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert!(body["request_id"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/dashboard")
                .header(ADMIN_TOKEN_HEADER, TOKEN)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_public_routes_do_not_need_token() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let app = app(&config).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/timeline?notice_date=2026-01-15")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_form_submissions_are_rate_limited() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.rate_limit = RateLimitConfig {
        forms_rpm: 1,
        ..RateLimitConfig::default()
    };
    let app = app(&config).await;

    let first = app.clone().oneshot(contact_request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.clone().oneshot(contact_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().get(header::RETRY_AFTER).is_some());
    let body = body_json(second).await;
    assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");

    // Other categories keep their own budget
    let health = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_can_be_disabled() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.rate_limit = RateLimitConfig {
        enabled: false,
        forms_rpm: 1,
        ..RateLimitConfig::default()
    };
    let app = app(&config).await;

    for _ in 0..3 {
        let response = app.clone().oneshot(contact_request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}

#[tokio::test]
async fn test_responses_carry_security_and_limit_headers() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let app = app(&config).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-ratelimit-limit").unwrap(), "60");
}

#[tokio::test]
async fn test_dev_mode_opens_admin_routes() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.admin_token = None;
    config.dev_mode = true;
    let app = app(&config).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/leads")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
