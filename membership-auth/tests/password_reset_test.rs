mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{unique_email, TestApp, TEST_PASSWORD};
use membership_auth::{models::UserRole, services::PASSWORD_RESET_ACK};
use serde_json::json;

#[tokio::test]
async fn forgot_password_response_does_not_reveal_registration() {
    let app = TestApp::spawn();
    let user = app.seed_user(&unique_email("registered"), UserRole::Null).await;

    let (known_status, known_body) = app
        .post_raw("/api/auth/forgot-password", json!({ "email": user.email }), None)
        .await;
    let (unknown_status, unknown_body) = app
        .post_raw(
            "/api/auth/forgot-password",
            json!({ "email": unique_email("stranger") }),
            None,
        )
        .await;

    assert_eq!(known_status, StatusCode::OK);
    assert_eq!(unknown_status, StatusCode::OK);
    assert_eq!(known_body, unknown_body);

    let body: serde_json::Value = serde_json::from_slice(&known_body).unwrap();
    assert_eq!(body["message"], PASSWORD_RESET_ACK);

    // only the registered address got mail
    let sent = app.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, user.email);
}

#[tokio::test]
async fn reset_token_sets_new_password_once() {
    let app = TestApp::spawn();
    let user = app.seed_user(&unique_email("forgetful"), UserRole::Null).await;

    app.post_json("/api/auth/forgot-password", json!({ "email": user.email }), None)
        .await;
    let token = app.email.last_token_for(&user.email).expect("reset mail");
    assert_eq!(token.len(), 64);

    let (status, body) = app
        .post_json(
            "/api/auth/reset-password",
            json!({ "token": token, "new_password": "brand-new-password" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password reset successful");

    let (status, _) = app
        .post_json(
            "/api/auth/login",
            json!({ "email": user.email, "password": "brand-new-password" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post_json(
            "/api/auth/login",
            json!({ "email": user.email, "password": TEST_PASSWORD }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post_json(
            "/api/auth/reset-password",
            json!({ "token": token, "new_password": "third-password" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn reset_token_expires_after_a_day() {
    let app = TestApp::spawn();
    let user = app.seed_user(&unique_email("slow"), UserRole::Null).await;

    app.post_json("/api/auth/forgot-password", json!({ "email": user.email }), None)
        .await;
    let token = app.email.last_token_for(&user.email).expect("reset mail");

    app.clock.advance(Duration::hours(24));

    let (status, body) = app
        .post_json(
            "/api/auth/reset-password",
            json!({ "token": token, "new_password": "too-late-password" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
    assert_eq!(app.store.reset_token_count(), 0);
}

#[tokio::test]
async fn unknown_reset_token_is_rejected() {
    let app = TestApp::spawn();

    let (status, body) = app
        .post_json(
            "/api/auth/reset-password",
            json!({ "token": "00".repeat(32), "new_password": "whatever-password" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn short_new_password_is_a_validation_error() {
    let app = TestApp::spawn();

    let (status, _) = app
        .post_json(
            "/api/auth/reset-password",
            json!({ "token": "abc", "new_password": "short" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
