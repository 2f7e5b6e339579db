//! Persistence seams for users, officers and reset tokens.
//!
//! `AuthService` only talks to these traits. [`super::Database`] is the
//! PostgreSQL implementation, [`super::InMemoryStore`] backs tests and local
//! runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Officer, ResetToken, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique constraint rejected the write.
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    /// A stored row could not be mapped back into a model.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// User and officer records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Lookup by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Returns `false` when no user has this id.
    async fn update_user_password_digest(
        &self,
        user_id: Uuid,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// The user's active officer record, if any. Inactive records are ignored.
    async fn find_officer_by_user_id(&self, user_id: Uuid) -> Result<Option<Officer>, StoreError>;

    async fn insert_officer(&self, officer: &Officer) -> Result<Uuid, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Reset token rows.
#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StoreError>;

    /// Atomically mark the row holding `value` as consumed and return it.
    ///
    /// Returns `None` when no row matches or the row was already claimed. Of
    /// any number of concurrent callers with the same value, at most one gets
    /// `Some`.
    async fn claim_reset_token(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError>;

    async fn delete_reset_token(&self, id: Uuid) -> Result<(), StoreError>;

    /// Remove expired and consumed rows. Returns how many were removed.
    async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
