pub mod auth;

pub use auth::{auth_middleware, authenticate_request, AuthUser};
