//! Document-store boundary
//!
//! The lifecycle layer talks to its backing store exclusively through the
//! [`DocumentStore`] trait: inserts, field-level updates and two ordered,
//! limited query shapes (single-value equality and bounded multi-value
//! membership). The store is a remote, managed service in production; every
//! operation suspends at that I/O boundary. [`MemoryStore`] is the in-process
//! backend used by tests and embedders.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A schemaless record as exchanged with the store
pub type Document = serde_json::Map<String, Value>;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Maximum number of values a multi-value membership query accepts
///
/// Mirrors the cap of the backing service; callers needing more values must
/// partition into batches.
pub const MAX_ANY_OF_VALUES: usize = 10;

/// Errors surfaced by store backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Interface to a document-oriented data store
///
/// Both query operations return documents ordered by `order_by` descending,
/// capped at `limit`. Results are point-in-time snapshots; no cursor or
/// pagination contract is provided.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return its store-assigned identifier
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<String>;

    /// Read a single document by identifier
    async fn fetch(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Merge `fields` into an existing document as one atomic write
    ///
    /// Fields absent from `fields` are left untouched. Fails with
    /// [`StoreError::NotFound`] when `id` does not exist.
    async fn update_fields(&self, collection: &str, id: &str, fields: Document)
        -> StoreResult<()>;

    /// Documents where `field == value`, ordered by `order_by` descending
    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: Value,
        order_by: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;

    /// Documents where `field` matches any of `values` (at most
    /// [`MAX_ANY_OF_VALUES`]), ordered by `order_by` descending
    async fn query_any_of(
        &self,
        collection: &str,
        field: &str,
        values: &[Value],
        order_by: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>>;
}

/// Serialize a domain value into a store document
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(
            format!("expected a JSON object, got {}", other),
        ))),
    }
}

/// Deserialize a store document into a domain value
pub fn from_document<T: DeserializeOwned>(document: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// In-memory [`DocumentStore`] backend
///
/// Collections live in a map guarded by an async mutex; identifiers are
/// UUIDv4 strings assigned at insert time and written into the stored
/// document under `"id"`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in a collection
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.lock().await;
        collections.get(collection).map_or(0, |docs| docs.len())
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().to_string();
        document.insert("id".to_string(), Value::String(id.clone()));

        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);

        log::trace!("Inserted document {} into {}", id, collection);
        Ok(id)
    }

    async fn fetch(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn update_fields(
        &self,
        collection: &str,
        id: &str,
        fields: Document,
    ) -> StoreResult<()> {
        let mut collections = self.collections.lock().await;
        let document = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;

        for (key, value) in fields {
            document.insert(key, value);
        }
        Ok(())
    }

    async fn query_equals(
        &self,
        collection: &str,
        field: &str,
        value: Value,
        order_by: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.lock().await;
        let mut matches: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field) == Some(&value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_descending(&mut matches, order_by);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn query_any_of(
        &self,
        collection: &str,
        field: &str,
        values: &[Value],
        order_by: &str,
        limit: usize,
    ) -> StoreResult<Vec<Document>> {
        if values.len() > MAX_ANY_OF_VALUES {
            return Err(StoreError::InvalidQuery(format!(
                "membership filter accepts at most {} values, got {}",
                MAX_ANY_OF_VALUES,
                values.len()
            )));
        }

        let collections = self.collections.lock().await;
        let mut matches: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| doc.get(field).is_some_and(|v| values.contains(v)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_descending(&mut matches, order_by);
        matches.truncate(limit);
        Ok(matches)
    }
}

/// Sort documents by a field, descending; documents missing the field sort
/// last
///
/// Timestamps are stored as epoch microseconds, so numeric order is
/// chronological order. Exposed for store backend implementors.
pub fn sort_descending(documents: &mut [Document], order_by: &str) {
    documents.sort_by(|a, b| compare_values(b.get(order_by), a.get(order_by)));
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(user: &str, created_at: &str) -> Document {
        let mut document = Document::new();
        document.insert("user_id".to_string(), json!(user));
        document.insert("created_at".to_string(), json!(created_at));
        document
    }

    #[tokio::test]
    async fn test_insert_and_fetch() {
        let store = MemoryStore::new();
        let id = store
            .insert("events", doc("u1", "2026-08-01T10:00:00Z"))
            .await
            .unwrap();

        let fetched = store.fetch("events", &id).await.unwrap().unwrap();
        assert_eq!(fetched["id"], json!(id));
        assert_eq!(fetched["user_id"], json!("u1"));
        assert!(store.fetch("events", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_fields_merges() {
        let store = MemoryStore::new();
        let id = store
            .insert("events", doc("u1", "2026-08-01T10:00:00Z"))
            .await
            .unwrap();

        let mut fields = Document::new();
        fields.insert("status".to_string(), json!("acked"));
        store.update_fields("events", &id, fields).await.unwrap();

        let fetched = store.fetch("events", &id).await.unwrap().unwrap();
        assert_eq!(fetched["status"], json!("acked"));
        assert_eq!(fetched["user_id"], json!("u1")); // untouched

        let result = store
            .update_fields("events", "missing", Document::new())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_query_equals_orders_descending_and_limits() {
        let store = MemoryStore::new();
        for hour in ["08", "10", "09"] {
            let created = format!("2026-08-01T{}:00:00Z", hour);
            store.insert("events", doc("u1", &created)).await.unwrap();
        }
        store
            .insert("events", doc("u2", "2026-08-01T11:00:00Z"))
            .await
            .unwrap();

        let results = store
            .query_equals("events", "user_id", json!("u1"), "created_at", 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["created_at"], json!("2026-08-01T10:00:00Z"));
        assert_eq!(results[1]["created_at"], json!("2026-08-01T09:00:00Z"));
    }

    #[tokio::test]
    async fn test_query_any_of_rejects_oversized_value_sets() {
        let store = MemoryStore::new();
        let values: Vec<Value> = (0..11).map(|i| json!(format!("u{}", i))).collect();

        let result = store
            .query_any_of("events", "user_id", &values, "created_at", 10)
            .await;
        assert!(matches!(result, Err(StoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_query_any_of_matches_value_set() {
        let store = MemoryStore::new();
        store
            .insert("events", doc("u1", "2026-08-01T08:00:00Z"))
            .await
            .unwrap();
        store
            .insert("events", doc("u2", "2026-08-01T09:00:00Z"))
            .await
            .unwrap();
        store
            .insert("events", doc("u3", "2026-08-01T10:00:00Z"))
            .await
            .unwrap();

        let results = store
            .query_any_of(
                "events",
                "user_id",
                &[json!("u1"), json!("u3")],
                "created_at",
                10,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["user_id"], json!("u3"));
        assert_eq!(results[1]["user_id"], json!("u1"));
    }

    #[test]
    fn test_document_round_trip() {
        use serde::{Deserialize, Serialize};

        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Sample {
            name: String,
            count: u32,
        }

        let sample = Sample {
            name: "a".to_string(),
            count: 3,
        };
        let document = to_document(&sample).unwrap();
        assert_eq!(from_document::<Sample>(document).unwrap(), sample);
    }
}
