pub mod identity;
pub mod officer;
pub mod reset_token;
pub mod user;

pub use identity::Identity;
pub use officer::{
    Officer, OfficerPlacement, OrganizationalLevel, ParseLevelError, RegionalField,
    DEFAULT_JOB_TITLE,
};
pub use reset_token::{ResetToken, RESET_TOKEN_TTL_HOURS};
pub use user::{normalize_email, Gender, SanitizedUser, User, UserRole};
