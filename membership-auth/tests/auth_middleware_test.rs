mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Duration;
use common::{test_config, unique_email, TestApp};
use membership_auth::{
    config::JwtConfig,
    models::{OrganizationalLevel, UserRole},
    services::JwtService,
};
use secrecy::SecretString;
use serde_json::json;

fn create_pengurus_request(authorization: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/create-pengurus")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
        .body(Body::from(
            json!({ "user_id": uuid::Uuid::new_v4(), "level": "PR", "komisariat": "FISIP" })
                .to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn every_token_failure_yields_the_same_401() {
    let app = TestApp::spawn();
    let user = app.seed_user(&unique_email("officer"), UserRole::Null).await;
    app.seed_officer(&user, OrganizationalLevel::Pk).await;
    let valid = app.officer_token(&user.email).await;

    let foreign = JwtService::new(
        &JwtConfig {
            secret: SecretString::new("some-other-secret-entirely-0123456789".to_string()),
        },
        app.clock.clone(),
    )
    .unwrap()
    .issue(&user.identity())
    .unwrap();

    let mut bodies = Vec::new();
    for authorization in [
        None,
        Some("Bearer".to_string()),
        Some("Basic dXNlcjpwYXNz".to_string()),
        Some("Bearer not.a.jwt".to_string()),
        Some(format!("Bearer {foreign}")),
    ] {
        let (status, body) = app.send(create_pengurus_request(authorization.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
        bodies.push(body);
    }

    app.clock.advance(Duration::hours(24));
    let (status, body) = app
        .send(create_pengurus_request(Some(format!("Bearer {valid}"))))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    bodies.push(body);

    let first = bodies[0].clone();
    assert!(bodies.iter().all(|b| *b == first));
    let parsed: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(parsed["error"], "Invalid or expired token");
}

#[tokio::test]
async fn scheme_is_case_insensitive() {
    let app = TestApp::spawn();
    let user = app.seed_user(&unique_email("officer"), UserRole::Null).await;
    app.seed_officer(&user, OrganizationalLevel::Pk).await;
    let token = app.officer_token(&user.email).await;
    let target = app.seed_user(&unique_email("rayon"), UserRole::Null).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/create-pengurus")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("bearer {token}"))
        .body(Body::from(
            json!({ "user_id": target.id, "level": "pr", "komisariat": "FISIP" }).to_string(),
        ))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn token_is_still_accepted_just_before_expiry() {
    let app = TestApp::with_config(test_config());
    let user = app.seed_user(&unique_email("officer"), UserRole::Null).await;
    app.seed_officer(&user, OrganizationalLevel::Pc).await;
    let token = app.officer_token(&user.email).await;
    let target = app.seed_user(&unique_email("komisariat"), UserRole::Null).await;

    app.clock.advance(Duration::hours(24) - Duration::seconds(1));

    let (status, _) = app
        .post_json(
            "/api/create-pengurus",
            json!({ "user_id": target.id, "level": "PK", "komisariat": "FEB" }),
            Some(&token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}
