//! HTTP handlers for membership-auth.

pub mod auth;
pub mod officer;

pub use auth::*;
pub use officer::create_pengurus;
