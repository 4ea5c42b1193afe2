use thiserror::Error;

// SQLite pool creation and configuration
pub mod connection;
pub mod migrations;

pub use connection::*;

/// Errors raised while opening or preparing the database
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("SQLite connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    /// The database file location is unusable
    #[error("Database path error: {0}")]
    ConfigError(String),

    /// A schema statement failed; the message names the table
    #[error("Database migration error: {0}")]
    MigrationError(String),
}
