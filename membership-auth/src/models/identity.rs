use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{OrganizationalLevel, UserRole};

/// Who authenticated, as resolved from the credential store for one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
    #[serde(rename = "pengurus_level", skip_serializing_if = "Option::is_none", default)]
    pub level: Option<OrganizationalLevel>,
    #[serde(rename = "pengurus_jabatan", skip_serializing_if = "Option::is_none", default)]
    pub job_title: Option<String>,
}
