use std::sync::PoisonError;
use thiserror::Error;

use crate::database::DatabaseError;

/// Error type for mapper operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A unique column already holds the value
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Value the store cannot represent
    #[error("Invalid value: {0}")]
    Invalid(String),
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

impl RepositoryError {
    /// Classify a rusqlite error, turning UNIQUE violations into `Duplicate`
    pub(crate) fn from_write(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(code, message)
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                RepositoryError::Duplicate(message.clone().unwrap_or_else(|| error.to_string()))
            }
            _ => RepositoryError::Sqlite(error),
        }
    }
}
