//! The Reflab HTTP server: a role-gated API for clinical referral
//! laboratory management.
//!
//! Surfaces: auth (register / login / whoami / seed-admin), patients, the
//! test catalog, referrals, and test results, all over a pluggable document
//! store with an in-memory default backend.

pub mod config;
pub mod error;
pub mod handlers;
pub mod observability;
pub mod resources;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use error::ApiError;
pub use server::{ReflabServer, build_app};
pub use state::AppState;
