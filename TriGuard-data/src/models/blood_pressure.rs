use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a blood pressure record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureRecord {
    /// Primary key, assigned on insert
    pub id: i64,

    /// Owning account
    pub account_id: i64,

    /// Systolic blood pressure (the higher number)
    pub systolic: u16,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: u16,

    /// Optional pulse rate in beats per minute
    pub pulse: Option<u16>,

    /// Day the measurement was taken
    pub date: NaiveDate,

    /// Time of day the measurement was taken, `HH:MM`
    pub time: String,

    /// Optional notes about the record
    pub notes: Option<String>,

    /// When the record was created in the system
    pub create_time: DateTime<Utc>,
}
