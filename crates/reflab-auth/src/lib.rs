//! Authentication and authorization for the Reflab server.
//!
//! This crate owns the credential store (Argon2 password hashing), the token
//! service (HS256 bearer tokens), the user storage over the document store,
//! the auth service (register / login / seed-admin), and the axum middleware
//! that gates every protected operation on a per-operation allowed-role set.

pub mod config;
pub mod error;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod service;
pub mod token;
pub mod user;

pub use config::{AuthConfig, BootstrapConfig};
pub use error::AuthError;
pub use middleware::{AuthContext, AuthState, BearerAuth};
pub use service::AuthService;
pub use token::{AccessTokenClaims, TokenService};
pub use user::{DocumentUserStore, PublicUser, User, UserStorage};

/// Convenience result type for auth operations.
pub type AuthResult<T> = std::result::Result<T, AuthError>;
