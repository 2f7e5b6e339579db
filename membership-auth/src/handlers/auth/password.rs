use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::{
        auth::{ForgotPasswordRequest, ResetPasswordRequest},
        MessageResponse,
    },
    utils::ValidatedJson,
    AppState,
};

/// Request a password reset link
///
/// The response is identical whether or not the email belongs to an account.
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Request received", body = MessageResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ack = state.auth.request_password_reset(&req.email).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new(ack))))
}

/// Set a new password using a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successful", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth.complete_password_reset(req).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password reset successful")),
    ))
}
