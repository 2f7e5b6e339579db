pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use service_core::axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::{
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::config::{AuthConfig, StorageBackend};
use crate::services::{
    AuthService, CredentialStore, Database, EmailProvider, InMemoryStore, JwtService,
    ResetTokenStore,
};
use crate::utils::Clock;
use service_core::error::AppError;
use std::sync::Arc;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::registration::register,
        handlers::auth::session::login,
        handlers::auth::session::login_pengurus,
        handlers::auth::password::forgot_password,
        handlers::auth::password::reset_password,
        handlers::officer::create_pengurus,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::auth::LoginUser,
            dtos::auth::ForgotPasswordRequest,
            dtos::auth::ResetPasswordRequest,
            dtos::officer::CreateOfficerRequest,
            dtos::officer::CreateOfficerResponse,
            models::UserRole,
            models::Gender,
            models::OrganizationalLevel,
            models::OfficerPlacement,
            models::SanitizedUser,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password reset"),
        (name = "Pengurus", description = "Officer hierarchy management"),
        (name = "Observability", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AuthConfig>,
    pub auth: AuthService,
    pub login_rate_limiter: IpRateLimiter,
    pub register_rate_limiter: IpRateLimiter,
    pub password_reset_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wire `auth` with rate limiters sized from `config.rate_limit`.
    pub fn new(config: Arc<AuthConfig>, auth: AuthService) -> Self {
        let limits = &config.rate_limit;
        let login_rate_limiter =
            create_ip_rate_limiter(limits.login_attempts, limits.login_window_seconds);
        let register_rate_limiter =
            create_ip_rate_limiter(limits.register_attempts, limits.register_window_seconds);
        let password_reset_rate_limiter = create_ip_rate_limiter(
            limits.password_reset_attempts,
            limits.password_reset_window_seconds,
        );

        Self {
            config,
            auth,
            login_rate_limiter,
            register_rate_limiter,
            password_reset_rate_limiter,
        }
    }
}

/// Connect the configured storage backend and assemble the auth service.
///
/// Postgres migrations run here, before any request can be served.
pub async fn build_auth_service(
    config: &AuthConfig,
    email: Arc<dyn EmailProvider>,
    clock: Arc<dyn Clock>,
) -> Result<AuthService, AppError> {
    let (credentials, tokens): (Arc<dyn CredentialStore>, Arc<dyn ResetTokenStore>) =
        match &config.storage {
            StorageBackend::Postgres(db_config) => {
                let pool = db::create_pool(db_config)
                    .await
                    .map_err(|e| AppError::DatabaseError(e.into()))?;
                db::run_migrations(&pool)
                    .await
                    .map_err(|e| AppError::DatabaseError(e.into()))?;
                let database = Arc::new(Database::new(pool));
                (database.clone(), database)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; all data is lost on restart");
                let store = Arc::new(InMemoryStore::new());
                (store.clone(), store)
            }
        };

    let jwt = JwtService::new(&config.jwt, clock.clone()).map_err(AppError::ConfigError)?;

    Ok(AuthService::new(credentials, tokens, jwt, email, clock))
}

pub fn build_router(state: AppState) -> Router {
    // Login routes share one limiter
    let login_limiter = state.login_rate_limiter.clone();
    let login_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/login-pengurus", post(handlers::auth::login_pengurus))
        .layer(from_fn_with_state(login_limiter, ip_rate_limit_middleware));

    let register_limiter = state.register_rate_limiter.clone();
    let register_route = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            register_limiter,
            ip_rate_limit_middleware,
        ));

    let reset_request_limiter = state.password_reset_rate_limiter.clone();
    let reset_request_route = Router::new()
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .layer(from_fn_with_state(
            reset_request_limiter,
            ip_rate_limit_middleware,
        ));

    let protected_routes = Router::new()
        .route("/api/create-pengurus", post(handlers::create_pengurus))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .merge(login_routes)
        .merge(register_route)
        .merge(reset_request_route)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Storage is unreachable", body = ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.auth.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Storage health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "storage": "up"
        }
    })))
}
