use rusqlite::Connection;
use tracing::info;

use crate::database::DatabaseError;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Running SQLite migrations");

    create_accounts_table(conn)?;
    create_blood_pressure_table(conn)?;
    create_blood_pressure_index(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the accounts table
fn create_accounts_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating accounts table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            phone TEXT UNIQUE,
            role TEXT NOT NULL,
            register_time TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| DatabaseError::MigrationError(format!("accounts: {}", e)))?;

    Ok(())
}

/// Create the blood pressure records table
fn create_blood_pressure_table(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating blood_pressure_records table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS blood_pressure_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            account_id INTEGER NOT NULL REFERENCES accounts (id),
            systolic INTEGER NOT NULL,
            diastolic INTEGER NOT NULL,
            pulse INTEGER,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            notes TEXT,
            create_time TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| DatabaseError::MigrationError(format!("blood_pressure_records: {}", e)))?;

    Ok(())
}

/// Create index on owner and date, the only lookup path for listing
fn create_blood_pressure_index(conn: &Connection) -> Result<(), DatabaseError> {
    info!("Creating index on account_id, date");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_blood_pressure_records_account_date
        ON blood_pressure_records (account_id, date)",
        [],
    )
    .map_err(|e| DatabaseError::MigrationError(format!("Failed to create index: {}", e)))?;

    Ok(())
}
