//! Business logic: password hashing orchestration, bearer tokens, reset
//! tokens, the officer hierarchy and the stores behind them.

mod auth;
mod database;
mod email;
pub mod error;
mod jwt;
mod memory;
pub mod policy;
pub mod reset_token;
pub mod store;

pub use auth::{AuthService, LoginOutcome, PASSWORD_RESET_ACK};
pub use database::Database;
pub use email::{EmailProvider, MockEmailService, NoopEmailService};
pub use error::ServiceError;
pub use jwt::{Claims, JwtService, TokenError, TOKEN_TTL_HOURS};
pub use memory::InMemoryStore;
pub use policy::{AuthorizationPolicy, PolicyError};
pub use reset_token::{generate_token_value, ResetTokenManager};
pub use store::{CredentialStore, ResetTokenStore, StoreError};
