use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use reflab_core::DocumentId;
use reflab_storage::{DocumentStore, SortOrder, StorageError, StoredDocument};
use serde_json::{Map, Value};
use time::OffsetDateTime;

pub(crate) type StorageKey = String; // Format: "collection/id"

fn make_key(collection: &str, id: &DocumentId) -> StorageKey {
    format!("{collection}/{id}")
}

/// In-memory document store backed by a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    data: DashMap<StorageKey, StoredDocument>,
}

impl MemoryDocumentStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    fn collection_docs(&self, collection: &str) -> Vec<StoredDocument> {
        let prefix = format!("{collection}/");
        self.data
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.value().clone())
            .collect()
    }
}

/// Compares two documents on the requested sort field.
///
/// The envelope timestamps sort chronologically; body fields sort as
/// strings, with absent fields last.
fn compare_on(a: &StoredDocument, b: &StoredDocument, sort: &SortOrder) -> Ordering {
    let ord = match sort.field.as_str() {
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        field => match (a.field_str(field), b.field_str(field)) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    if sort.descending { ord.reverse() } else { ord }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        body: Value,
    ) -> Result<StoredDocument, StorageError> {
        if !body.is_object() {
            return Err(StorageError::invalid_document(
                "document body must be a JSON object",
            ));
        }
        let doc = StoredDocument::new(collection, body);
        self.data.insert(make_key(collection, &doc.id), doc.clone());
        Ok(doc)
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<StoredDocument>, StorageError> {
        Ok(self
            .data
            .get(&make_key(collection, id))
            .map(|entry| entry.value().clone()))
    }

    async fn find_one(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let prefix = format!("{collection}/");
        Ok(self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .find(|entry| entry.value().field_str(field) == Some(value))
            .map(|entry| entry.value().clone()))
    }

    async fn list(
        &self,
        collection: &str,
        sort: &SortOrder,
        limit: usize,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let mut docs = self.collection_docs(collection);
        docs.sort_by(|a, b| compare_on(a, b, sort));
        docs.truncate(limit);
        Ok(docs)
    }

    async fn apply(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: Map<String, Value>,
    ) -> Result<Option<StoredDocument>, StorageError> {
        let Some(mut entry) = self.data.get_mut(&make_key(collection, id)) else {
            return Ok(None);
        };
        let doc = entry.value_mut();
        match doc.body.as_object_mut() {
            Some(map) => {
                for (k, v) in patch {
                    map.insert(k, v);
                }
            }
            None => {
                return Err(StorageError::invalid_document(
                    "stored document body is not a JSON object",
                ));
            }
        }
        doc.updated_at = OffsetDateTime::now_utc();
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StorageError> {
        Ok(self.data.remove(&make_key(collection, id)).is_some())
    }

    async fn count_matching(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<usize, StorageError> {
        let prefix = format!("{collection}/");
        Ok(self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .filter(|entry| entry.value().field_str(field) == Some(value))
            .count())
    }

    async fn collection_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self
            .data
            .iter()
            .filter_map(|entry| {
                entry
                    .key()
                    .split_once('/')
                    .map(|(collection, _)| collection.to_string())
            })
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
