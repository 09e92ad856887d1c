//! Storage layer plumbing shared by the account, catalog, and order stores
//!
//! Each store owns its own redb database file. redb serializes write
//! transactions, so a read-check-write sequence inside one write
//! transaction is atomic — this is what backs every conditional update
//! (stock decrement, balance debit, history status CAS, order claim).
//! There is no transaction spanning two databases; multi-store workflows
//! are sagas with explicit compensation in the engine.

use redb::Database;
use std::path::Path;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage error occurred");
        shared::AppError::database(err.to_string())
    }
}

/// Open or create a database file at the given path
pub(crate) fn open_file(path: impl AsRef<Path>) -> StorageResult<Database> {
    Ok(Database::create(path)?)
}

/// Open an in-memory database (for testing)
#[cfg(test)]
pub(crate) fn open_in_memory() -> StorageResult<Database> {
    Ok(Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?)
}
