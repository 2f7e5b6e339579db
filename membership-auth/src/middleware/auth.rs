use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::{
    services::{Claims, JwtService, ServiceError},
    AppState,
};

/// Resolve the `Authorization` header value into verified claims.
///
/// Only the `Bearer` scheme is accepted (case-insensitive). The specific
/// failure kind is returned for logging; callers present all of them as one
/// generic unauthorized response.
pub fn authenticate_request(jwt: &JwtService, header: Option<&str>) -> Result<Claims, ServiceError> {
    let value = header.ok_or(ServiceError::MissingAuthorizationHeader)?;

    let token = match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => return Err(ServiceError::Malformed),
    };
    if token.is_empty() {
        return Err(ServiceError::Malformed);
    }

    Ok(jwt.verify(token)?)
}

/// Middleware to require authentication
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::debug!(kind = "malformed", "Authorization header is not visible ASCII");
            AppError::from(ServiceError::Malformed)
        })?),
    };

    let claims = authenticate_request(state.auth.jwt(), header).map_err(|e| {
        tracing::debug!(kind = e.kind(), path = %req.uri().path(), "Request authentication failed");
        AppError::from(e)
    })?;

    tracing::debug!(user_id = %claims.user_id, "Request authenticated");

    // Store claims in request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extractor for the claims attached by [`auth_middleware`].
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<Claims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthUser(claims.clone()))
    }
}
