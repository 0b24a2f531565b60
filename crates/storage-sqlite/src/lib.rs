//! SQLite adapter for the relational system of record.
//!
//! Provides the connection pool, embedded migrations, the diesel schema and
//! the transactional [`reports::ReportRepository`] implementing the core
//! repository trait.

pub mod db;
pub mod errors;
pub mod reports;
pub mod schema;

pub use db::{create_pool, get_connection, run_migrations, DbConnection, DbPool};
pub use errors::StorageError;
pub use reports::ReportRepository;
