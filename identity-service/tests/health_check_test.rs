//! Health endpoint and cross-cutting HTTP layers.

mod common;

use axum::http::{Method, StatusCode};
use common::{test_config, TestApp};
use identity_service::{services::InMemoryCredentialStore, AppState};
use std::sync::Arc;

#[tokio::test]
async fn health_check_reports_store_up() {
    let app = TestApp::spawn();
    let res = app.get("/health", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "healthy");
    assert_eq!(res.body["service"], "identity-service-test");
    assert_eq!(res.body["checks"]["store"], "up");
}

#[tokio::test]
async fn health_check_reports_store_down() {
    let app = TestApp::spawn();
    app.store.set_unavailable(true);

    let res = app.get("/health", None).await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["status"], "unhealthy");
    assert_eq!(res.body["checks"]["store"], "down");
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let app = TestApp::spawn();
    let res = app.get("/health", None).await;

    assert_eq!(res.headers["x-content-type-options"], "nosniff");
    assert_eq!(res.headers["x-frame-options"], "DENY");
    assert!(res.headers.contains_key("content-security-policy"));
    assert!(res.headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn error_responses_carry_security_headers() {
    let app = TestApp::spawn();
    let res = app.get("/me", None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let app = TestApp::spawn();

    let preflight = |origin: &'static str| {
        axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/login")
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .body(axum::body::Body::empty())
            .unwrap()
    };

    use tower::ServiceExt;
    let allowed = app
        .router
        .clone()
        .oneshot(preflight("http://allowed.com"))
        .await
        .unwrap();
    assert_eq!(
        allowed.headers()["access-control-allow-origin"],
        "http://allowed.com"
    );

    let denied = app
        .router
        .clone()
        .oneshot(preflight("http://evil.com"))
        .await
        .unwrap();
    assert!(!denied
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = TestApp::spawn();
    let res = app.get("/nope", None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_route_with_token_is_not_found() {
    let app = TestApp::spawn();
    let (_, token) = app.signed_in("ada@example.com").await;

    let res = app.get("/nope", Some(token.as_str())).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[test]
fn app_state_rejects_unrepresentable_token_expiry() {
    let mut config = test_config("secret");
    config.jwt.token_expiry_days = 200_000_000_000_000;

    let result = AppState::new(config, Arc::new(InMemoryCredentialStore::new()));
    assert!(result.is_err());
}
