//! User accounts and global roles.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Identity;

/// Global membership role. `Pkn` is the top administrative role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Null,
    Mapaba,
    Pkd,
    Pkl,
    Pkn,
}

impl UserRole {
    /// Role allowed to create officers at any level, including PB.
    pub const TOP_ADMIN: UserRole = UserRole::Pkn;

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Null => "null",
            UserRole::Mapaba => "mapaba",
            UserRole::Pkd => "pkd",
            UserRole::Pkl => "pkl",
            UserRole::Pkn => "pkn",
        }
    }

    pub fn is_top_admin(&self) -> bool {
        *self == Self::TOP_ADMIN
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "null" | "" => Ok(UserRole::Null),
            "mapaba" => Ok(UserRole::Mapaba),
            "pkd" => Ok(UserRole::Pkd),
            "pkl" => Ok(UserRole::Pkl),
            "pkn" => Ok(UserRole::Pkn),
            other => Err(format!("Invalid user role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("Invalid gender: {}", other)),
        }
    }
}

/// Stored user record. Holds the password digest; never serialize this
/// directly, use [`User::sanitized`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub member_id: Option<String>,
    pub role: UserRole,
    pub board_code: Option<String>,
    pub gender: Option<Gender>,
    pub birth_day: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a freshly registered, active user with no role.
    pub fn new(email: String, password_hash: String, full_name: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            full_name,
            member_id: None,
            role: UserRole::Null,
            board_code: None,
            gender: None,
            birth_day: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Identity without any officer position.
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            level: None,
            job_title: None,
        }
    }

    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser::from(self)
    }
}

/// User view safe to return to callers.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SanitizedUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
    pub role: UserRole,
    #[serde(rename = "code_kepengurusan", skip_serializing_if = "Option::is_none")]
    pub board_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<NaiveDate>,
    pub active: bool,
}

impl From<&User> for SanitizedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            member_id: user.member_id.clone(),
            role: user.role,
            board_code: user.board_code.clone(),
            gender: user.gender,
            birth_day: user.birth_day,
            active: user.active,
        }
    }
}

/// Canonical form used for every email lookup and insert.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
