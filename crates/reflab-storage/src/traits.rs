//! Storage traits for the document store abstraction.

use async_trait::async_trait;
use reflab_core::DocumentId;
use serde_json::{Map, Value};

use crate::error::StorageError;
use crate::types::{SortOrder, StoredDocument};

/// The contract every document store backend must implement.
///
/// Backends must be thread-safe (`Send + Sync`). All operations act on a
/// single document; cross-document consistency is the caller's problem.
///
/// # Example
///
/// ```ignore
/// use reflab_storage::{DocumentStore, StorageError, StoredDocument};
///
/// async fn get_patient(
///     store: &dyn DocumentStore,
///     id: &DocumentId,
/// ) -> Result<StoredDocument, StorageError> {
///     store
///         .find_by_id("patient", id)
///         .await?
///         .ok_or_else(|| StorageError::not_found("patient", id.to_string()))
/// }
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns it with a server-assigned id and
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidDocument` if the body is not a JSON
    /// object.
    async fn insert(&self, collection: &str, body: Value)
    -> Result<StoredDocument, StorageError>;

    /// Reads a document by collection and id.
    ///
    /// Returns `None` if the document does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// documents.
    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Finds the first document whose body field equals the given string
    /// value. Used for lookups on business keys such as a user's email.
    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Lists documents in a collection, sorted and capped.
    async fn list(
        &self,
        collection: &str,
        sort: &SortOrder,
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StorageError>;

    /// Merges the given fields into an existing document's body and stamps
    /// its updated-at time, returning the post-write document.
    ///
    /// Returns `None` if no document with that id exists.
    async fn apply(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Map<String, Value>,
    ) -> Result<Option<StoredDocument>, StorageError>;

    /// Deletes a document. Idempotent: deleting an absent document succeeds.
    ///
    /// Returns `true` if a document was actually removed.
    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StorageError>;

    /// Counts documents whose body field equals the given string value.
    async fn count_matching(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<usize, StorageError>;

    /// Returns the names of all non-empty collections.
    async fn collection_names(&self) -> Result<Vec<String>, StorageError>;

    /// Checks connectivity to the backend.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConnectionError` if the backend is unreachable.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Returns the name of this backend for logging and the probe endpoint.
    fn backend_name(&self) -> &'static str;
}
