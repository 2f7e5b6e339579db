//! Who may create officers at which organizational level.
//!
//! An officer may only create officers strictly below their own level. A
//! caller holding the top administrative role may create any level, which is
//! how the first PB officer comes into existence. Anyone else may create
//! nothing.

use std::fmt;

use crate::models::{OfficerPlacement, OrganizationalLevel, UserRole};
use crate::services::Claims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    InsufficientPermission,
    /// Wire name of the missing placement field.
    MissingRequiredField(&'static str),
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::InsufficientPermission => f.write_str("insufficient permission"),
            PolicyError::MissingRequiredField(field) => write!(f, "missing required field {}", field),
        }
    }
}

impl std::error::Error for PolicyError {}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    pub fn can_create(
        role: UserRole,
        actor_level: Option<OrganizationalLevel>,
        target: OrganizationalLevel,
    ) -> bool {
        if role.is_top_admin() {
            return true;
        }
        match actor_level {
            Some(level) => level.outranks(target),
            None => false,
        }
    }

    pub fn authorize_creation(actor: &Claims, target: OrganizationalLevel) -> Result<(), PolicyError> {
        if Self::can_create(actor.role, actor.level, target) {
            Ok(())
        } else {
            Err(PolicyError::InsufficientPermission)
        }
    }

    /// Blank strings count as missing.
    pub fn validate_required_fields(
        target: OrganizationalLevel,
        placement: &OfficerPlacement,
    ) -> Result<(), PolicyError> {
        match target.required_field() {
            Some(field) if placement.get(field).is_none() => {
                Err(PolicyError::MissingRequiredField(field.field_name()))
            }
            _ => Ok(()),
        }
    }

    /// Permission first, then required fields.
    pub fn authorize_officer_creation(
        actor: &Claims,
        target: OrganizationalLevel,
        placement: &OfficerPlacement,
    ) -> Result<(), PolicyError> {
        Self::authorize_creation(actor, target)?;
        Self::validate_required_fields(target, placement)
    }
}
