//! In-memory document store with the same merge semantics as the REST
//! client, used by tests and offline development.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use roadreport_core::documents::{Document, DocumentStore};
use roadreport_core::Result;

type Collection = BTreeMap<String, Map<String, Value>>;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document wholesale, replacing any existing one.
    pub fn seed(&self, collection: &str, id: &str, fields: Map<String, Value>) {
        let mut collections = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
        let collections = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .filter(|(_, fields)| fields.get(field) == Some(value))
            .map(|(id, fields)| Document::new(id.as_str(), fields.clone()))
            .collect())
    }

    fn merge(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<()> {
        let mut collections = self.collections.lock().unwrap_or_else(PoisonError::into_inner);
        let document = collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default();
        for (name, value) in fields {
            document.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}
