use diesel::result::{DatabaseErrorKind, Error as DieselError};
use roadreport_core::errors::DatabaseError;
use roadreport_core::Error;
use thiserror::Error;

/// Failures local to the SQLite adapter, converted to the core error type at
/// the repository boundary.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Diesel(#[from] DieselError),
}

impl StorageError {
    /// True when the wrapped diesel error is a UNIQUE constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Diesel(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Pool(message) => Error::Database(DatabaseError::Pool(message)),
            StorageError::Migration(message) => Error::Database(DatabaseError::Internal(message)),
            StorageError::Diesel(DieselError::NotFound) => {
                Error::Database(DatabaseError::Query("record not found".to_string()))
            }
            StorageError::Diesel(error) => Error::Database(DatabaseError::Query(error.to_string())),
        }
    }
}

/// Transaction error carrier. `immediate_transaction` requires its error type
/// to absorb diesel's own BEGIN/COMMIT failures, while the work inside a
/// transaction reports core errors (including document store failures during
/// a publish). Both collapse back into the core error once the transaction
/// resolves.
#[derive(Debug)]
pub(crate) enum TxError {
    Storage(StorageError),
    Core(Error),
}

impl From<DieselError> for TxError {
    fn from(error: DieselError) -> Self {
        Self::Storage(StorageError::Diesel(error))
    }
}

impl From<TxError> for Error {
    fn from(error: TxError) -> Self {
        match error {
            // Diesel errors surfacing directly here come from transaction
            // handling itself; statement failures inside the closure arrive
            // already converted, as `Core`.
            TxError::Storage(StorageError::Diesel(err)) => {
                Error::Database(DatabaseError::Transaction(err.to_string()))
            }
            TxError::Storage(storage) => storage.into(),
            TxError::Core(core) => core,
        }
    }
}
