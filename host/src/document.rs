//! Stored document type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_engine::{CollectionId, DocumentId, Fields};

/// A document as held by [`MemoryStore`](crate::MemoryStore) and delivered
/// to bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Collection this document belongs to
    pub collection: CollectionId,
    /// Unique within the collection
    pub id: DocumentId,
    /// Document fields
    pub data: Value,
    /// Time of the last write
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(collection: impl Into<CollectionId>, id: impl Into<DocumentId>, data: Value) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            data,
            updated_at: Utc::now(),
        }
    }

    /// Read a top-level string field.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

impl Fields for Document {
    fn fields(&self) -> &Value {
        &self.data
    }
}
