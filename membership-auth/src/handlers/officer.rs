use service_core::{
    axum::{extract::State, http::StatusCode, response::IntoResponse, Json},
    error::AppError,
};

use crate::{
    dtos::officer::{CreateOfficerRequest, CreateOfficerResponse},
    middleware::AuthUser,
    utils::ValidatedJson,
    AppState,
};

/// Create an officer (pengurus) position for an existing user
///
/// Officers may only create positions below their own level; the top
/// administrative role may create any level.
#[utoipa::path(
    post,
    path = "/api/create-pengurus",
    request_body = CreateOfficerRequest,
    responses(
        (status = 201, description = "Pengurus created successfully", body = CreateOfficerResponse),
        (status = 400, description = "Invalid level or missing regional field", body = ErrorResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 403, description = "Insufficient permission", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Pengurus",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_pengurus(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateOfficerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let officer = state.auth.create_officer(&actor, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateOfficerResponse {
            message: "Pengurus created successfully".to_string(),
            pengurus_id: officer.id,
        }),
    ))
}
