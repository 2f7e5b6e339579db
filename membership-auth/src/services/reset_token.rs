use rand::{rngs::OsRng, RngCore};
use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceError;
use super::store::{CredentialStore, ResetTokenStore};
use crate::models::ResetToken;
use crate::utils::{Clock, PasswordHashString};

/// Random bytes per token value; rendered as twice as many hex characters.
const TOKEN_BYTES: usize = 32;

/// Fresh 256-bit token value as 64 lowercase hex characters.
pub fn generate_token_value() -> Result<String, ServiceError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("random source unavailable: {}", e)))?;
    Ok(hex::encode(bytes))
}

/// Issues and consumes single-use password reset tokens.
#[derive(Clone)]
pub struct ResetTokenManager {
    tokens: Arc<dyn ResetTokenStore>,
    credentials: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl ResetTokenManager {
    pub fn new(
        tokens: Arc<dyn ResetTokenStore>,
        credentials: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tokens,
            credentials,
            clock,
        }
    }

    /// Generate, store and return a token value for `user_id`.
    pub async fn issue(&self, user_id: Uuid) -> Result<String, ServiceError> {
        let value = generate_token_value()?;
        self.store_value(user_id, value.clone()).await?;
        Ok(value)
    }

    /// Persist an already generated value, valid for 24 hours from now.
    pub async fn store_value(&self, user_id: Uuid, value: String) -> Result<(), ServiceError> {
        let token = ResetToken::new(user_id, value, self.clock.now());
        self.tokens.insert_reset_token(&token).await?;
        tracing::debug!(user_id = %user_id, expires_at = %token.expires_at, "Reset token stored");
        Ok(())
    }

    /// Spend `value` on setting the owner's password digest to `digest`.
    ///
    /// The claim is atomic, so of several concurrent calls with the same value
    /// at most one succeeds. The row is discarded whatever the outcome; failing
    /// to delete it afterwards is logged and otherwise ignored.
    pub async fn consume(&self, value: &str, digest: &PasswordHashString) -> Result<Uuid, ServiceError> {
        if value.trim().is_empty() {
            return Err(ServiceError::TokenNotFound);
        }

        let now = self.clock.now();
        let Some(token) = self.tokens.claim_reset_token(value, now).await? else {
            return Err(ServiceError::TokenNotFound);
        };

        if token.is_expired_at(now) {
            tracing::info!(user_id = %token.user_id, "Expired reset token presented");
            self.discard(&token).await;
            return Err(ServiceError::TokenExpired);
        }

        let updated = match self
            .credentials
            .update_user_password_digest(token.user_id, digest.as_str(), now)
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                self.discard(&token).await;
                return Err(e.into());
            }
        };

        self.discard(&token).await;

        if !updated {
            tracing::warn!(user_id = %token.user_id, "Reset token owner no longer exists");
            return Err(ServiceError::TokenNotFound);
        }

        tracing::info!(user_id = %token.user_id, "Password reset completed");
        Ok(token.user_id)
    }

    /// Remove expired and spent rows.
    pub async fn purge_expired(&self) -> Result<u64, ServiceError> {
        let removed = self.tokens.purge_expired_reset_tokens(self.clock.now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Purged stale reset tokens");
        }
        Ok(removed)
    }

    async fn discard(&self, token: &ResetToken) {
        if let Err(e) = self.tokens.delete_reset_token(token.id).await {
            tracing::warn!(
                error = %e,
                reset_token_id = %token.id,
                "Failed to delete consumed reset token"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::services::store::StoreError;
    use crate::services::InMemoryStore;
    use crate::utils::FixedClock;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};

    struct Fixture {
        manager: ResetTokenManager,
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        user: User,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let user = User::new(
            "member@example.com".to_string(),
            "old-digest".to_string(),
            "Member".to_string(),
            clock.now(),
        );
        store.insert_user(&user).await.unwrap();
        let manager = ResetTokenManager::new(store.clone(), store.clone(), clock.clone());
        Fixture {
            manager,
            store,
            clock,
            user,
        }
    }

    fn digest(s: &str) -> PasswordHashString {
        PasswordHashString::new(s.to_string())
    }

    #[test]
    fn token_values_are_64_lowercase_hex_and_distinct() {
        let a = generate_token_value().unwrap();
        let b = generate_token_value().unwrap();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn consume_updates_password_and_removes_row() {
        let f = fixture().await;
        let value = f.manager.issue(f.user.id).await.unwrap();

        let owner = f.manager.consume(&value, &digest("new-digest")).await.unwrap();

        assert_eq!(owner, f.user.id);
        let stored = f.store.find_user_by_id(f.user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new-digest");
        assert_eq!(f.store.reset_token_count(), 0);
    }

    #[tokio::test]
    async fn second_consume_fails() {
        let f = fixture().await;
        let value = f.manager.issue(f.user.id).await.unwrap();

        f.manager.consume(&value, &digest("first")).await.unwrap();
        let err = f.manager.consume(&value, &digest("second")).await.unwrap_err();

        assert!(matches!(err, ServiceError::TokenNotFound));
        let stored = f.store.find_user_by_id(f.user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "first");
    }

    #[tokio::test]
    async fn unknown_and_empty_values_are_not_found() {
        let f = fixture().await;
        for value in ["", "   ", "deadbeef"] {
            let err = f.manager.consume(value, &digest("x")).await.unwrap_err();
            assert!(matches!(err, ServiceError::TokenNotFound), "{value:?}");
        }
    }

    #[tokio::test]
    async fn expired_token_is_rejected_and_never_reusable() {
        let f = fixture().await;
        let value = f.manager.issue(f.user.id).await.unwrap();

        f.clock.advance(Duration::hours(24));

        let err = f.manager.consume(&value, &digest("late")).await.unwrap_err();
        assert!(matches!(err, ServiceError::TokenExpired));

        let err = f.manager.consume(&value, &digest("late")).await.unwrap_err();
        assert!(matches!(err, ServiceError::TokenNotFound));

        let stored = f.store.find_user_by_id(f.user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "old-digest");
    }

    #[tokio::test]
    async fn token_still_works_one_second_before_expiry() {
        let f = fixture().await;
        let value = f.manager.issue(f.user.id).await.unwrap();

        f.clock.advance(Duration::hours(24) - Duration::seconds(1));

        assert!(f.manager.consume(&value, &digest("just-in-time")).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumes_succeed_exactly_once() {
        let f = fixture().await;
        let value = f.manager.issue(f.user.id).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let manager = f.manager.clone();
                let value = value.clone();
                tokio::spawn(async move { manager.consume(&value, &digest(&format!("d{i}"))).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn purge_removes_only_stale_rows() {
        let f = fixture().await;
        f.manager.issue(f.user.id).await.unwrap();
        f.clock.advance(Duration::hours(25));
        f.manager.issue(f.user.id).await.unwrap();

        assert_eq!(f.manager.purge_expired().await.unwrap(), 1);
        assert_eq!(f.store.reset_tokens_for(f.user.id).len(), 1);
    }

    /// Delegates to an in-memory store but fails every delete.
    struct StickyTokens(InMemoryStore);

    #[async_trait]
    impl ResetTokenStore for StickyTokens {
        async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
            self.0.insert_reset_token(token).await
        }

        async fn claim_reset_token(
            &self,
            value: &str,
            now: DateTime<Utc>,
        ) -> Result<Option<ResetToken>, StoreError> {
            self.0.claim_reset_token(value, now).await
        }

        async fn delete_reset_token(&self, _id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("delete refused".to_string()))
        }

        async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
            self.0.purge_expired_reset_tokens(now).await
        }
    }

    #[tokio::test]
    async fn cleanup_failure_after_update_is_swallowed() {
        let f = fixture().await;
        let tokens = Arc::new(StickyTokens(InMemoryStore::new()));
        let manager = ResetTokenManager::new(tokens, f.store.clone(), f.clock.clone());

        let value = manager.issue(f.user.id).await.unwrap();
        assert_eq!(manager.consume(&value, &digest("new")).await.unwrap(), f.user.id);

        // the leftover row is inert
        let err = manager.consume(&value, &digest("again")).await.unwrap_err();
        assert!(matches!(err, ServiceError::TokenNotFound));
    }
}
