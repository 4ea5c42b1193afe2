use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::base::BaseMapper;
use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::blood_pressure::BloodPressureRecord;

/// Mapper for the `blood_pressure_records` table
#[async_trait]
pub trait BloodPressureMapper: BaseMapper<BloodPressureRecord> {
    /// All records of one account taken on `date`, earliest time first
    async fn select_by_account_and_date(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BloodPressureRecord>, RepositoryError>;
}

const RECORD_COLUMNS: &str =
    "id, account_id, systolic, diastolic, pulse, date, time, notes, create_time";

/// SQLite implementation of [`BloodPressureMapper`]
#[derive(Debug, Clone)]
pub struct SqliteBloodPressureMapper {
    pool: DatabasePool,
}

impl SqliteBloodPressureMapper {
    /// Create a mapper over the given pool
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_record(row: &Row<'_>) -> rusqlite::Result<BloodPressureRecord> {
    Ok(BloodPressureRecord {
        id: row.get(0)?,
        account_id: row.get(1)?,
        systolic: row.get(2)?,
        diastolic: row.get(3)?,
        pulse: row.get(4)?,
        date: row.get(5)?,
        time: row.get(6)?,
        notes: row.get(7)?,
        create_time: row.get(8)?,
    })
}

#[async_trait]
impl BaseMapper<BloodPressureRecord> for SqliteBloodPressureMapper {
    async fn insert(&self, entity: BloodPressureRecord) -> Result<BloodPressureRecord, RepositoryError> {
        debug!(
            "Inserting blood pressure record: account={}, {}/{}",
            entity.account_id, entity.systolic, entity.diastolic
        );
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO blood_pressure_records
             (account_id, systolic, diastolic, pulse, date, time, notes, create_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entity.account_id,
                entity.systolic,
                entity.diastolic,
                entity.pulse,
                entity.date,
                &entity.time,
                &entity.notes,
                &entity.create_time,
            ],
        )
        .map_err(RepositoryError::from_write)?;

        Ok(BloodPressureRecord {
            id: conn.last_insert_rowid(),
            ..entity
        })
    }

    async fn select_by_id(&self, id: i64) -> Result<Option<BloodPressureRecord>, RepositoryError> {
        debug!("Selecting blood pressure record by id: {}", id);
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM blood_pressure_records WHERE id = ?1", RECORD_COLUMNS);
        let record = conn.query_row(&sql, [id], map_record).optional()?;
        Ok(record)
    }

    async fn update_by_id(&self, entity: &BloodPressureRecord) -> Result<bool, RepositoryError> {
        debug!("Updating blood pressure record: id={}", entity.id);
        let conn = self.pool.get()?;

        let changed = conn
            .execute(
                "UPDATE blood_pressure_records SET account_id = ?1, systolic = ?2, diastolic = ?3,
                 pulse = ?4, date = ?5, time = ?6, notes = ?7, create_time = ?8 WHERE id = ?9",
                params![
                    entity.account_id,
                    entity.systolic,
                    entity.diastolic,
                    entity.pulse,
                    entity.date,
                    &entity.time,
                    &entity.notes,
                    &entity.create_time,
                    entity.id,
                ],
            )
            .map_err(RepositoryError::from_write)?;

        Ok(changed > 0)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        debug!("Deleting blood pressure record: id={}", id);
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM blood_pressure_records WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl BloodPressureMapper for SqliteBloodPressureMapper {
    async fn select_by_account_and_date(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BloodPressureRecord>, RepositoryError> {
        debug!("Selecting blood pressure records: account={}, date={}", account_id, date);
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM blood_pressure_records
             WHERE account_id = ?1 AND date = ?2
             ORDER BY time ASC, id ASC",
            RECORD_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![account_id, date], map_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
