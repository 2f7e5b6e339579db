mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::TestApp;

#[tokio::test]
async fn health_reports_storage_up() {
    let app = TestApp::spawn();

    let (status, body) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["storage"], "up");
}

#[tokio::test]
async fn openapi_document_lists_every_route() {
    let app = TestApp::spawn();

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/.well-known/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    for path in [
        "/health",
        "/api/auth/register",
        "/api/auth/login",
        "/api/auth/login-pengurus",
        "/api/auth/forgot-password",
        "/api/auth/reset-password",
        "/api/create-pengurus",
    ] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::spawn();

    let response = tower::ServiceExt::oneshot(
        app.router.clone(),
        Request::builder()
            .uri("/health")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-123"
    );
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
