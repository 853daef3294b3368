//! JSON-file-backed document store
//!
//! Persists every collection into a single JSON file so events survive
//! between CLI invocations. The whole state is rewritten on each mutating
//! operation; fine for a household-sized event log, not meant for anything
//! bigger.

use async_trait::async_trait;
use health_events::store::{
    sort_descending, Document, DocumentStore, StoreError, StoreResult, MAX_ANY_OF_VALUES,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type State = HashMap<String, HashMap<String, Document>>;

pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl JsonFileStore {
    /// Open a store file, creating an empty state when the file is missing
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => State::new(),
            Err(error) => return Err(error.into()),
        };

        log::debug!("Opened event store at {:?}", path);
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &State) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn insert(&self, collection: &str, mut document: Document) -> StoreResult<String> {
        let id = uuid_string();
        document.insert("id".to_string(), Value::String(id.clone()));

        // The file write commits before the cached state; a failed write
        // leaves cache and file identical.
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.entry(collection.to_string())
            .or_default()
            .insert(id.clone(), document);
        self.persist(&next).await?;
        *state = next;
        Ok(id)
    }

    async fn fetch(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let state = self.state.lock().await;
        Ok(state
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: Document) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let document = next
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
        for (key, value) in fields {
            document.insert(key, value);
        }
        self.persist(&next).await?;
        *state = next;
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
        let state = self.state.lock().await;
        let mut matches: Vec<Document> = state
            .get(collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|document| document.get(field) == Some(&value))
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

        let state = self.state.lock().await;
        let mut matches: Vec<Document> = state
            .get(collection)
            .map(|documents| {
                documents
                    .values()
                    .filter(|document| document.get(field).is_some_and(|v| values.contains(v)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        sort_descending(&mut matches, order_by);
        matches.truncate(limit);
        Ok(matches)
    }
}

fn uuid_string() -> String {
    uuid::Uuid::new_v4().to_string()
}
