//! PostgreSQL implementation of the credential and reset token stores.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::store::{CredentialStore, ResetTokenStore, StoreError};
use crate::models::{
    Gender, Officer, OfficerPlacement, OrganizationalLevel, ResetToken, User, UserRole,
};

/// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_write_error(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Duplicate(what.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    email: String,
    password_hash: String,
    full_name: String,
    member_id: Option<String>,
    role_code: String,
    board_code: Option<String>,
    gender_code: Option<String>,
    birth_day: Option<NaiveDate>,
    active_flag: bool,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = row.role_code.parse().map_err(StoreError::Corrupt)?;
        let gender = row
            .gender_code
            .as_deref()
            .map(str::parse::<Gender>)
            .transpose()
            .map_err(StoreError::Corrupt)?;

        Ok(User {
            id: row.user_id,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            member_id: row.member_id,
            role,
            board_code: row.board_code,
            gender,
            birth_day: row.birth_day,
            active: row.active_flag,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OfficerRow {
    officer_id: Uuid,
    user_id: Uuid,
    level_code: String,
    regional_area: Option<String>,
    branch: Option<String>,
    campus_unit: Option<String>,
    secretariat_address: Option<String>,
    job_title: String,
    active_flag: bool,
    created_utc: DateTime<Utc>,
    updated_utc: DateTime<Utc>,
}

impl TryFrom<OfficerRow> for Officer {
    type Error = StoreError;

    fn try_from(row: OfficerRow) -> Result<Self, Self::Error> {
        let level = row
            .level_code
            .parse::<OrganizationalLevel>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Officer {
            id: row.officer_id,
            user_id: row.user_id,
            level,
            placement: OfficerPlacement {
                regional_area: row.regional_area,
                branch: row.branch,
                campus_unit: row.campus_unit,
                secretariat_address: row.secretariat_address,
            },
            job_title: row.job_title,
            active: row.active_flag,
            created_at: row.created_utc,
            updated_at: row.updated_utc,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResetTokenRow {
    reset_token_id: Uuid,
    user_id: Uuid,
    token_text: String,
    expiry_utc: DateTime<Utc>,
    consumed_utc: Option<DateTime<Utc>>,
    created_utc: DateTime<Utc>,
}

impl From<ResetTokenRow> for ResetToken {
    fn from(row: ResetTokenRow) -> Self {
        ResetToken {
            id: row.reset_token_id,
            user_id: row.user_id,
            token: row.token_text,
            expires_at: row.expiry_utc,
            consumed_at: row.consumed_utc,
            created_at: row.created_utc,
        }
    }
}

#[async_trait]
impl CredentialStore for Database {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, password_hash, full_name, member_id, role_code,
                               board_code, gender_code, birth_day, active_flag, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.member_id)
        .bind(user.role.as_str())
        .bind(&user.board_code)
        .bind(user.gender.map(|g| g.as_str()))
        .bind(user.birth_day)
        .bind(user.active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "email already registered"))?;
        Ok(())
    }

    async fn update_user_password_digest(
        &self,
        user_id: Uuid,
        digest: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_utc = $3 WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(digest)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_officer_by_user_id(&self, user_id: Uuid) -> Result<Option<Officer>, StoreError> {
        sqlx::query_as::<_, OfficerRow>(
            r#"
            SELECT * FROM officers
            WHERE user_id = $1 AND active_flag
            ORDER BY created_utc DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Officer::try_from)
        .transpose()
    }

    async fn insert_officer(&self, officer: &Officer) -> Result<Uuid, StoreError> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO officers (officer_id, user_id, level_code, regional_area, branch, campus_unit,
                                  secretariat_address, job_title, active_flag, created_utc, updated_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING officer_id
            "#,
        )
        .bind(officer.id)
        .bind(officer.user_id)
        .bind(officer.level.as_str())
        .bind(&officer.placement.regional_area)
        .bind(&officer.placement.branch)
        .bind(&officer.placement.campus_unit)
        .bind(&officer.placement.secretariat_address)
        .bind(&officer.job_title)
        .bind(officer.active)
        .bind(officer.created_at)
        .bind(officer.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "officer record"))?;
        Ok(id)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Database health check failed");
            StoreError::Unavailable(e.to_string())
        })?;
        Ok(())
    }
}

#[async_trait]
impl ResetTokenStore for Database {
    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO reset_tokens (reset_token_id, user_id, token_text, expiry_utc, consumed_utc, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(token.id)
        .bind(token.user_id)
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.consumed_at)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "reset token value"))?;
        Ok(())
    }

    async fn claim_reset_token(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError> {
        // Single conditional UPDATE: concurrent claims serialize on the row
        // lock and only the first sees consumed_utc IS NULL.
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r#"
            UPDATE reset_tokens
            SET consumed_utc = $2
            WHERE token_text = $1 AND consumed_utc IS NULL
            RETURNING *
            "#,
        )
        .bind(value)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ResetToken::from))
    }

    async fn delete_reset_token(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM reset_tokens WHERE reset_token_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_reset_tokens(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM reset_tokens WHERE expiry_utc <= $1 OR consumed_utc IS NOT NULL",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
