use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::OfficerPlacement;

/// Request to give an existing user an officer position.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOfficerRequest {
    pub user_id: Uuid,

    /// One of PB, PKC, PC, PK, PR (case-insensitive).
    #[validate(length(min = 1, message = "Level is required"))]
    #[schema(example = "PC")]
    pub level: String,

    #[serde(flatten)]
    pub placement: OfficerPlacement,

    /// Defaults to "Ketua".
    #[serde(rename = "jabatan", default)]
    #[validate(length(max = 100, message = "Jabatan must be at most 100 characters"))]
    #[schema(example = "Sekretaris")]
    pub job_title: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateOfficerResponse {
    #[schema(example = "Pengurus created successfully")]
    pub message: String,
    pub pengurus_id: Uuid,
}
