//! Shared setup for the HTTP-level tests: the full router over in-memory
//! storage, a recording mailbox and a clock the test controls.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use membership_auth::{
    build_router,
    config::{AuthConfig, Environment, JwtConfig, RateLimitConfig, SecurityConfig, StorageBackend},
    models::{Officer, OfficerPlacement, OrganizationalLevel, User, UserRole},
    services::{AuthService, CredentialStore, InMemoryStore, JwtService, MockEmailService},
    utils::{hash_password, Clock, FixedClock, Password},
    AppState,
};
use secrecy::SecretString;
use serde_json::Value;
use service_core::observability::LogFormat;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const TEST_PASSWORD: &str = "correct-horse-battery";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "membership-auth".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        log_format: LogFormat::Pretty,
        storage: StorageBackend::Memory,
        jwt: JwtConfig {
            secret: SecretString::new(TEST_JWT_SECRET.to_string()),
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 1000,
            login_window_seconds: 60,
            register_attempts: 1000,
            register_window_seconds: 60,
            password_reset_attempts: 1000,
            password_reset_window_seconds: 60,
        },
        reset_token_purge_interval_secs: 3600,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub email: Arc<MockEmailService>,
    pub clock: Arc<FixedClock>,
    pub jwt: JwtService,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AuthConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let email = Arc::new(MockEmailService::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let jwt = JwtService::new(&config.jwt, clock.clone()).expect("jwt service");

        let auth = AuthService::new(
            store.clone(),
            store.clone(),
            jwt.clone(),
            email.clone(),
            clock.clone(),
        );
        let router = build_router(AppState::new(Arc::new(config), auth));

        Self {
            router,
            store,
            email,
            clock,
            jwt,
        }
    }

    /// Insert a user directly, bypassing registration.
    pub async fn seed_user(&self, email: &str, role: UserRole) -> User {
        let digest = hash_password(&Password::new(TEST_PASSWORD.to_string())).expect("hash");
        let mut user = User::new(
            email.to_string(),
            digest.into_string(),
            "Seeded Member".to_string(),
            self.clock.now(),
        );
        user.role = role;
        self.store.insert_user(&user).await.expect("insert user");
        user
    }

    /// Give `user` an active officer position at `level`.
    pub async fn seed_officer(&self, user: &User, level: OrganizationalLevel) -> Officer {
        let officer = Officer::new(
            user.id,
            level,
            full_placement(),
            Some("Ketua".to_string()),
            self.clock.now(),
        );
        self.store.insert_officer(&officer).await.expect("insert officer");
        officer
    }

    /// Log in through the officer endpoint and return the bearer token.
    pub async fn officer_token(&self, email: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/auth/login-pengurus",
                serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "officer login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let (status, bytes) = self.post_raw(uri, body, bearer).await;
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Like `post_json` but returns the body bytes untouched.
    pub async fn post_raw(
        &self,
        uri: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }
}

pub fn full_placement() -> OfficerPlacement {
    OfficerPlacement {
        regional_area: Some("Jawa Timur".to_string()),
        branch: Some("Surabaya".to_string()),
        campus_unit: Some("UIN Sunan Ampel".to_string()),
        secretariat_address: None,
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}-{}@example.com", prefix, Uuid::new_v4().simple())
}
