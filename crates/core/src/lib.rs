//! Core domain models and the bidirectional synchronization engine that
//! reconciles the relational system of record with the document store used by
//! offline-capable mobile clients.
//!
//! This crate is storage-agnostic: the relational side is reached through
//! [`reports::ReportRepositoryTrait`] and the document side through
//! [`documents::DocumentStore`]. Concrete adapters live in the
//! `roadreport-storage-sqlite` and `roadreport-firestore` crates.

pub mod documents;
pub mod errors;
pub mod reports;
pub mod sync;

pub use errors::{Error, Result};
