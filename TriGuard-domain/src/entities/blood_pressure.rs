use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Domain entity for a stored blood pressure record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureRecord {
    /// Record id
    pub id: i64,

    /// Owning account
    pub account_id: i64,

    /// Systolic blood pressure (the higher number)
    pub systolic: u16,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: u16,

    /// Optional pulse rate in beats per minute
    pub pulse: Option<u16>,

    /// Day of the measurement
    pub date: NaiveDate,

    /// Time of day of the measurement, `HH:MM`
    pub time: String,

    /// Optional notes about the record
    pub notes: Option<String>,

    /// When the record was created
    pub create_time: DateTime<Utc>,

    /// Category derived from systolic and diastolic
    pub category: BloodPressureCategory,
}

/// Measurement fields shared by create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureForm {
    pub systolic: u16,
    pub diastolic: u16,
    pub pulse: Option<u16>,
    pub date: NaiveDate,
    pub time: String,
    pub notes: Option<String>,
}

/// Update of an existing record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBloodPressureForm {
    /// Record to update
    pub id: i64,

    /// New measurement fields
    pub form: BloodPressureForm,
}

/// Blood pressure category based on measurements
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BloodPressureCategory {
    /// Normal blood pressure (systolic < 120 and diastolic < 80)
    Normal,

    /// Elevated blood pressure (systolic 120-129 and diastolic < 80)
    Elevated,

    /// Stage 1 Hypertension (systolic 130-139 or diastolic 80-89)
    Hypertension1,

    /// Stage 2 Hypertension (systolic ≥ 140 or diastolic ≥ 90)
    Hypertension2,

    /// Hypertensive crisis (systolic ≥ 180 and/or diastolic ≥ 120)
    HypertensiveCrisis,
}

impl fmt::Display for BloodPressureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BloodPressureCategory::Normal => write!(f, "Normal"),
            BloodPressureCategory::Elevated => write!(f, "Elevated"),
            BloodPressureCategory::Hypertension1 => write!(f, "Hypertension Stage 1"),
            BloodPressureCategory::Hypertension2 => write!(f, "Hypertension Stage 2"),
            BloodPressureCategory::HypertensiveCrisis => write!(f, "Hypertensive Crisis"),
        }
    }
}
