//! Resource handlers for the four clinical surfaces.
//!
//! Each submodule owns one collection: its create payload, its typed patch,
//! and the axum handlers. The shared helpers here cover the id-parsing and
//! fetch-or-404 plumbing every surface repeats.

use reflab_core::{CoreError, DocumentId};
use reflab_storage::{DocumentStore, StoredDocument};
use serde_json::{Map, Value};

use crate::error::ApiError;

pub mod catalog;
pub mod patients;
pub mod referrals;
pub mod results;

/// Parses a path id, surfacing a malformed id as a client error.
pub(crate) fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).map_err(ApiError::from)
}

/// Fetches a document or reports NotFound under the resource's public name.
pub(crate) async fn fetch(
    store: &dyn DocumentStore,
    collection: &str,
    resource: &str,
    id: &DocumentId,
) -> Result<StoredDocument, ApiError> {
    store
        .find_by_id(collection, id)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::not_found(resource, id.to_string())))
}

/// Applies a patch or reports NotFound under the resource's public name.
pub(crate) async fn apply_patch(
    store: &dyn DocumentStore,
    collection: &str,
    resource: &str,
    id: &DocumentId,
    patch: Map<String, Value>,
) -> Result<StoredDocument, ApiError> {
    store
        .apply(collection, id, patch)
        .await?
        .ok_or_else(|| ApiError::from(CoreError::not_found(resource, id.to_string())))
}

/// Serializes a payload into the JSON object map the store's `apply` takes.
///
/// Patch structs skip unset fields during serialization, so absent fields
/// never touch the stored document.
pub(crate) fn to_patch_map<T: serde::Serialize>(patch: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(patch).map_err(CoreError::from)? {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::from(CoreError::invalid_document(
            "patch must be a JSON object",
        ))),
    }
}
