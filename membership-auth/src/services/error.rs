use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;
use super::policy::PolicyError;
use super::store::StoreError;
use crate::utils::HashingFailure;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing authorization header")]
    MissingAuthorizationHeader,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Malformed token")]
    Malformed,

    #[error("Reset token not found")]
    TokenNotFound,

    #[error("Reset token expired")]
    TokenExpired,

    #[error("Insufficient permission")]
    InsufficientPermission,

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Invalid pengurus level: {0}")]
    InvalidLevel(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Stable name of the failure, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidCredentials => "invalid_credentials",
            ServiceError::MissingAuthorizationHeader => "missing_authorization_header",
            ServiceError::InvalidSignature => "invalid_signature",
            ServiceError::Expired => "expired",
            ServiceError::Malformed => "malformed",
            ServiceError::TokenNotFound => "token_not_found",
            ServiceError::TokenExpired => "token_expired",
            ServiceError::InsufficientPermission => "insufficient_permission",
            ServiceError::MissingRequiredField(_) => "missing_required_field",
            ServiceError::InvalidLevel(_) => "invalid_level",
            ServiceError::UserNotFound => "user_not_found",
            ServiceError::EmailAlreadyRegistered => "email_already_registered",
            ServiceError::HashingFailure(_) => "hashing_failure",
            ServiceError::StorageFailure(_) => "storage_failure",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSignature => ServiceError::InvalidSignature,
            TokenError::Expired => ServiceError::Expired,
            TokenError::Malformed => ServiceError::Malformed,
            TokenError::Signing(e) => ServiceError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<PolicyError> for ServiceError {
    fn from(err: PolicyError) -> Self {
        match err {
            PolicyError::InsufficientPermission => ServiceError::InsufficientPermission,
            PolicyError::MissingRequiredField(field) => ServiceError::MissingRequiredField(field),
        }
    }
}

impl From<HashingFailure> for ServiceError {
    fn from(err: HashingFailure) -> Self {
        ServiceError::HashingFailure(err.0)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!(INVALID_CREDENTIALS))
            }
            ServiceError::MissingAuthorizationHeader
            | ServiceError::InvalidSignature
            | ServiceError::Expired
            | ServiceError::Malformed => AppError::Unauthorized(anyhow::anyhow!(INVALID_TOKEN)),
            ServiceError::TokenNotFound | ServiceError::TokenExpired => {
                AppError::BadRequest(anyhow::anyhow!(INVALID_TOKEN))
            }
            ServiceError::InsufficientPermission => AppError::Forbidden(anyhow::anyhow!(
                "Insufficient permission to create pengurus at this level"
            )),
            ServiceError::MissingRequiredField(field) => {
                AppError::BadRequest(anyhow::anyhow!("{} is required for this level", field))
            }
            ServiceError::InvalidLevel(level) => {
                AppError::BadRequest(anyhow::anyhow!("Invalid pengurus level: {}", level))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::HashingFailure(e) => {
                AppError::InternalError(anyhow::anyhow!("Password hashing failed: {}", e))
            }
            ServiceError::StorageFailure(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
