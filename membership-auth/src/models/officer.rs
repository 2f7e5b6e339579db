//! Officer (pengurus) records and the organizational level hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Job title given to an officer when none is supplied.
pub const DEFAULT_JOB_TITLE: &str = "Ketua";

/// Organizational level, from highest to lowest authority:
/// PB, PKC, PC, PK, PR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrganizationalLevel {
    Pb,
    Pkc,
    Pc,
    Pk,
    Pr,
}

impl OrganizationalLevel {
    /// All levels in authority order, highest first.
    pub const ALL: [OrganizationalLevel; 5] = [
        OrganizationalLevel::Pb,
        OrganizationalLevel::Pkc,
        OrganizationalLevel::Pc,
        OrganizationalLevel::Pk,
        OrganizationalLevel::Pr,
    ];

    /// Position in the hierarchy; 0 is the highest authority.
    pub const fn rank(self) -> u8 {
        match self {
            OrganizationalLevel::Pb => 0,
            OrganizationalLevel::Pkc => 1,
            OrganizationalLevel::Pc => 2,
            OrganizationalLevel::Pk => 3,
            OrganizationalLevel::Pr => 4,
        }
    }

    /// True when `self` has strictly more authority than `other`.
    pub fn outranks(self, other: OrganizationalLevel) -> bool {
        self.rank() < other.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrganizationalLevel::Pb => "PB",
            OrganizationalLevel::Pkc => "PKC",
            OrganizationalLevel::Pc => "PC",
            OrganizationalLevel::Pk => "PK",
            OrganizationalLevel::Pr => "PR",
        }
    }

    /// Placement field an officer at this level must carry, if any.
    pub fn required_field(self) -> Option<RegionalField> {
        match self {
            OrganizationalLevel::Pb => None,
            OrganizationalLevel::Pkc => Some(RegionalField::RegionalArea),
            OrganizationalLevel::Pc => Some(RegionalField::Branch),
            OrganizationalLevel::Pk | OrganizationalLevel::Pr => Some(RegionalField::CampusUnit),
        }
    }
}

impl fmt::Display for OrganizationalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid pengurus level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for OrganizationalLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PB" => Ok(OrganizationalLevel::Pb),
            "PKC" => Ok(OrganizationalLevel::Pkc),
            "PC" => Ok(OrganizationalLevel::Pc),
            "PK" => Ok(OrganizationalLevel::Pk),
            "PR" => Ok(OrganizationalLevel::Pr),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Regional placement fields of an officer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionalField {
    /// Regional area (wilayah), required for PKC.
    RegionalArea,
    /// Branch (cabang), required for PC.
    Branch,
    /// Campus unit (komisariat), required for PK and PR.
    CampusUnit,
}

impl RegionalField {
    /// Wire name of the field, as it appears in requests and errors.
    pub fn field_name(self) -> &'static str {
        match self {
            RegionalField::RegionalArea => "wilayah",
            RegionalField::Branch => "cabang",
            RegionalField::CampusUnit => "komisariat",
        }
    }
}

/// Where an officer serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OfficerPlacement {
    #[serde(rename = "wilayah", skip_serializing_if = "Option::is_none", default)]
    pub regional_area: Option<String>,
    #[serde(rename = "cabang", skip_serializing_if = "Option::is_none", default)]
    pub branch: Option<String>,
    #[serde(rename = "komisariat", skip_serializing_if = "Option::is_none", default)]
    pub campus_unit: Option<String>,
    #[serde(rename = "alamat_sekre", skip_serializing_if = "Option::is_none", default)]
    pub secretariat_address: Option<String>,
}

impl OfficerPlacement {
    /// Value of `field`, ignoring blank strings.
    pub fn get(&self, field: RegionalField) -> Option<&str> {
        let value = match field {
            RegionalField::RegionalArea => self.regional_area.as_deref(),
            RegionalField::Branch => self.branch.as_deref(),
            RegionalField::CampusUnit => self.campus_unit.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Officer record as persisted by the credential store.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Officer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level: OrganizationalLevel,
    #[serde(flatten)]
    pub placement: OfficerPlacement,
    #[serde(rename = "jabatan")]
    pub job_title: String,
    #[serde(rename = "aktif")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Officer {
    pub fn new(
        user_id: Uuid,
        level: OrganizationalLevel,
        placement: OfficerPlacement,
        job_title: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let job_title = job_title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_JOB_TITLE.to_string());

        Self {
            id: Uuid::new_v4(),
            user_id,
            level,
            placement,
            job_title,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
