//! Document store abstraction for the Reflab referral lab API.
//!
//! The server treats persistence as an external collaborator: a store of
//! opaque JSON documents reachable by collection name, exposed through the
//! [`DocumentStore`] trait. Backends must be safe for concurrent use and
//! provide single-document atomicity only; there are no multi-document
//! transactions, so concurrent writers race and the last write wins.

pub mod error;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use traits::DocumentStore;
pub use types::{SortOrder, StoredDocument};
