//! Document store adapters: a Firestore REST client for production and an
//! in-memory store with the same merge semantics for tests.

pub mod client;
pub mod memory;
pub mod value;

pub use client::{FirestoreClient, FirestoreConfig};
pub use memory::MemoryDocumentStore;
