//! Core domain types for the Reflab referral lab API.
//!
//! This crate holds the vocabulary shared by every other crate: the error
//! taxonomy, document identifiers, the role enumeration used for access
//! control, and the referral/result status machines.

pub mod error;
pub mod id;
pub mod lifecycle;
pub mod roles;

pub use error::{CoreError, Result};
pub use id::DocumentId;
pub use lifecycle::{Priority, ReferralStatus, ResultStatus};
pub use roles::Role;
