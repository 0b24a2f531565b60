//! Document store contract and per-collection record shapes.

mod model;

pub use model::*;

use serde_json::{Map, Value};

use crate::errors::Result;

/// Collection holding in-flight mobile submissions.
pub const SOURCE_COLLECTION: &str = "reports";

/// Collection holding the denormalized manager-facing projection.
pub const PUBLISHED_COLLECTION: &str = "reports_traites";

/// A keyed document with loosely-typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Keyed read/query/merge-write access to the replica document store.
///
/// Calls are blocking so a write can run inside the scope of one relational
/// transaction. The contract carries no retry/backoff of its own: every write
/// is an idempotent merge, so callers simply re-invoke on failure.
pub trait DocumentStore: Send + Sync {
    /// Read one document by id. A missing document is `Ok(None)`.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Return every document whose `field` equals `value`.
    fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>>;

    /// Partial merge write: fields omitted from `fields` are preserved on the
    /// stored document, never cleared.
    fn merge(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<()>;
}
