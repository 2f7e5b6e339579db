use chrono::Duration;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{Identity, OrganizationalLevel, UserRole};
use crate::utils::Clock;

/// Lifetime of an issued bearer token.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// Signed identity payload carried by bearer tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    #[serde(rename = "pengurus_level", skip_serializing_if = "Option::is_none", default)]
    pub level: Option<OrganizationalLevel>,
    #[serde(rename = "pengurus_jabatan", skip_serializing_if = "Option::is_none", default)]
    pub job_title: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.user_id,
            email: self.email.clone(),
            role: self.role,
            level: self.level,
            job_title: self.job_title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed")]
    Malformed,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies HS256 bearer tokens.
///
/// Only HS256 is accepted on verification. Expiry is checked against the
/// injected clock with zero leeway, so tests can move time deterministically.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Result<Self, anyhow::Error> {
        let secret = config.secret.expose_secret().as_bytes();
        if secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared against our own clock in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;

        tracing::info!("JWT service initialized with HS256");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock,
        })
    }

    /// Build the claim set for `identity`, valid from now for 24 hours.
    pub fn claims_for(&self, identity: &Identity) -> Claims {
        let now = self.clock.now();
        Claims {
            user_id: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            level: identity.level,
            job_title: identity.job_title.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }

    /// Sign a token for `identity`.
    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        let claims = self.claims_for(identity);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and expiry and return the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }
        })?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
