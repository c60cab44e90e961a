//! Data types used by the document store traits.

use reflab_core::DocumentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A document as stored in a backend.
///
/// The envelope owns the server-assigned fields (id, timestamps); the body
/// holds only client-visible data. Keeping id and created-at outside the
/// body means a partial update can never overwrite them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// The document id.
    pub id: DocumentId,
    /// The collection this document belongs to.
    pub collection: String,
    /// The document body as a JSON object.
    pub body: Value,
    /// When the document was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// When the document was originally created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl StoredDocument {
    /// Creates a new `StoredDocument` with a fresh id and timestamps.
    #[must_use]
    pub fn new(collection: impl Into<String>, body: Value) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: DocumentId::new(),
            collection: collection.into(),
            body,
            updated_at: now,
            created_at: now,
        }
    }

    /// Renders the external-facing shape of this document: the body fields
    /// plus a string `id` and RFC 3339 `created_at`/`updated_at`.
    #[must_use]
    pub fn public_projection(&self) -> Value {
        let mut out = match &self.body {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other.clone());
                map
            }
        };
        out.insert("id".to_string(), Value::String(self.id.to_string()));
        out.insert(
            "created_at".to_string(),
            Value::String(format_rfc3339(self.created_at)),
        );
        out.insert(
            "updated_at".to_string(),
            Value::String(format_rfc3339(self.updated_at)),
        );
        Value::Object(out)
    }

    /// Returns a body field as a string slice, if present.
    #[must_use]
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }
}

fn format_rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

/// Sort order for list operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortOrder {
    /// The field to sort by. `created_at` and `updated_at` refer to the
    /// envelope timestamps; any other name is looked up in the body.
    pub field: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl SortOrder {
    /// Creates an ascending sort order.
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Creates a descending sort order.
    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}
