use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::auth::{LoginRequest, LoginResponse, LoginUser},
    services::LoginOutcome,
    utils::ValidatedJson,
    AppState,
};

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let LoginOutcome {
            token,
            expires_in,
            user,
            identity,
        } = outcome;

        Self {
            token,
            token_type: "Bearer".to_string(),
            expires_in,
            user: LoginUser {
                id: user.id,
                email: user.email,
                full_name: user.full_name,
                role: identity.role,
                pengurus_level: identity.level,
                pengurus_jabatan: identity.job_title,
            },
        }
    }
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth.login(&req.email, req.password).await?;
    Ok((StatusCode::OK, Json(LoginResponse::from(outcome))))
}

/// Login as an officer (pengurus)
///
/// Succeeds only for users holding an active officer position; the token then
/// carries the position's level and job title.
#[utoipa::path(
    post,
    path = "/api/auth/login-pengurus",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login_pengurus(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.auth.login_as_officer(&req.email, req.password).await?;
    Ok((StatusCode::OK, Json(LoginResponse::from(outcome))))
}
