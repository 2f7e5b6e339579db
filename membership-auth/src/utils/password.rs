use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use thiserror::Error;

/// Well-formed argon2id digest that matches no password. Verifying against it
/// costs the same as a real check, which keeps unknown-email logins as slow
/// as wrong-password logins.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Newtype for password hash (PHC string format)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Digest used to verify logins for unknown accounts.
    pub fn dummy() -> Self {
        Self(DUMMY_HASH.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct HashingFailure(pub String);

/// Hash a password using Argon2id with a fresh 128-bit salt.
///
/// Fails only when the OS random source or the hasher itself fails.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, HashingFailure> {
    let mut salt_bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .map_err(|e| HashingFailure(format!("random source unavailable: {}", e)))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| HashingFailure(e.to_string()))?;

    let password_hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| HashingFailure(e.to_string()))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Verify a password against a stored digest.
///
/// Mismatches and unparseable digests both return `false`. The comparison
/// inside argon2 is constant-time.
pub fn verify_password(password: &Password, password_hash: &PasswordHashString) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(password_hash.as_str()) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_password_blocking(password: Password) -> Result<PasswordHashString, HashingFailure> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| HashingFailure(format!("hashing task failed: {}", e)))?
}

/// [`verify_password`] on the blocking pool. A panicked task counts as a
/// mismatch.
pub async fn verify_password_blocking(password: Password, password_hash: PasswordHashString) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await {
        Ok(matches) => matches,
        Err(e) => {
            tracing::error!(error = %e, "Password verification task failed");
            false
        }
    }
}
