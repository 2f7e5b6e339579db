use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Lifetime of a password reset token.
pub const RESET_TOKEN_TTL_HOURS: i64 = 24;

/// Single-use password reset credential.
///
/// Issued on a forgot-password request. `consumed_at` is set by the atomic
/// claim and the row is deleted afterwards; an expired row is unusable and is
/// removed by the first use attempt or by the periodic purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ResetToken {
    pub fn new(user_id: Uuid, token: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            token,
            expires_at: now + Duration::hours(RESET_TOKEN_TTL_HOURS),
            consumed_at: None,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
