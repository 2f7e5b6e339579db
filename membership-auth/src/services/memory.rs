//! DashMap-backed store used by tests and by local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use super::store::{CredentialStore, ResetTokenStore, StoreError};
use crate::models::{Officer, ResetToken, User};

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: DashMap<Uuid, User>,
    /// email -> user id
    emails: DashMap<String, Uuid>,
    officers: DashMap<Uuid, Officer>,
    /// token value -> row
    reset_tokens: DashMap<String, ResetToken>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reset token rows currently held, consumed or not.
    pub fn reset_token_count(&self) -> usize {
        self.reset_tokens.len()
    }

    pub fn reset_tokens_for(&self, user_id: Uuid) -> Vec<ResetToken> {
        self.reset_tokens
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(user_id) = self.emails.get(email).map(|id| *id) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!(
                "email {} already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(())
            }
        }
    }

    async fn update_user_password_digest(
        &self,
        user_id: Uuid,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        match self.users.get_mut(&user_id) {
            Some(mut user) => {
                user.password_hash = digest.to_string();
                user.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_officer_by_user_id(&self, user_id: Uuid) -> Result<Option<Officer>, StoreError> {
        Ok(self
            .officers
            .iter()
            .filter(|o| o.user_id == user_id && o.active)
            .max_by_key(|o| o.created_at)
            .map(|o| o.value().clone()))
    }

    async fn insert_officer(&self, officer: &Officer) -> Result<Uuid, StoreError> {
        if !self.users.contains_key(&officer.user_id) {
            return Err(StoreError::Corrupt(format!(
                "officer references unknown user {}",
                officer.user_id
            )));
        }
        self.officers.insert(officer.id, officer.clone());
        Ok(officer.id)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ResetTokenStore for InMemoryStore {
    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
        match self.reset_tokens.entry(token.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate("reset token value".to_string())),
            Entry::Vacant(slot) => {
                slot.insert(token.clone());
                Ok(())
            }
        }
    }

    async fn claim_reset_token(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError> {
        // The shard write lock held by get_mut makes check-and-mark one step.
        let Some(mut row) = self.reset_tokens.get_mut(value) else {
            return Ok(None);
        };
        if row.consumed_at.is_some() {
            return Ok(None);
        }
        row.consumed_at = Some(now);
        Ok(Some(row.clone()))
    }

    async fn delete_reset_token(&self, id: Uuid) -> Result<(), StoreError> {
        self.reset_tokens.retain(|_, row| row.id != id);
        Ok(())
    }

    async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.reset_tokens.len();
        self.reset_tokens
            .retain(|_, row| row.consumed_at.is_none() && !row.is_expired_at(now));
        Ok((before - self.reset_tokens.len()) as u64)
    }
}
