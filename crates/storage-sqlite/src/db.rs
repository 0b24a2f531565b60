use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use roadreport_core::{Error, Result};

use crate::errors::{StorageError, TxError};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates a bounded r2d2 pool over the given SQLite database path.
pub fn create_pool(database_url: &str) -> Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(MAX_CONNECTIONS)
        .connection_timeout(CONNECTION_TIMEOUT)
        .idle_timeout(Some(IDLE_TIMEOUT))
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| Error::from(StorageError::Pool(e.to_string())))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection> {
    pool.get()
        .map_err(|e| Error::from(StorageError::Pool(e.to_string())))
}

/// Applies any pending embedded migrations.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::from(StorageError::Migration(e.to_string())))?;
    if !applied.is_empty() {
        log::info!("applied {} database migration(s)", applied.len());
    }
    Ok(())
}

/// Runs `work` inside a single BEGIN IMMEDIATE transaction, committing on
/// `Ok` and rolling back every write on `Err`.
pub(crate) fn with_transaction<T, F>(conn: &mut SqliteConnection, work: F) -> Result<T>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T>,
{
    conn.immediate_transaction::<_, TxError, _>(|tx| work(tx).map_err(TxError::Core))
        .map_err(Error::from)
}
