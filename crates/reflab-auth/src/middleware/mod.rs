//! Axum middleware for bearer token authentication and role checks.

pub mod auth;
pub mod error;

pub use auth::{AuthContext, AuthState, BearerAuth};
