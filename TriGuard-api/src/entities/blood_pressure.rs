use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use triguard_domain::entities::blood_pressure::{
    BloodPressureForm, BloodPressureRecord, UpdateBloodPressureForm,
};

/// 24-hour `HH:MM`
pub static TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid time pattern"));

/// Public representation of a blood pressure record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BloodPressureVO {
    /// Record id
    pub id: i64,

    /// Owning account
    pub account_id: i64,

    /// Systolic blood pressure (the higher number)
    pub systolic: u16,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: u16,

    /// Pulse rate in beats per minute
    pub pulse: Option<u16>,

    /// Day of the measurement, `YYYY-MM-DD`
    #[schema(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,

    /// Time of the measurement, `HH:MM`
    #[schema(example = "08:30")]
    pub time: String,

    pub notes: Option<String>,

    /// When the record was created
    pub create_time: DateTime<Utc>,

    /// Category derived from the reading
    #[schema(example = "Normal")]
    pub category: String,
}

impl From<BloodPressureRecord> for BloodPressureVO {
    fn from(record: BloodPressureRecord) -> Self {
        Self {
            id: record.id,
            account_id: record.account_id,
            systolic: record.systolic,
            diastolic: record.diastolic,
            pulse: record.pulse,
            date: record.date,
            time: record.time,
            notes: record.notes,
            create_time: record.create_time,
            category: record.category.to_string(),
        }
    }
}

/// Body of `POST /api/blood-pressure/create`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BloodPressureCreateVO {
    /// Systolic blood pressure (the higher number)
    #[validate(range(min = 40, max = 300, message = "收缩压必须在40到300之间"))]
    pub systolic: u16,

    /// Diastolic blood pressure (the lower number)
    #[validate(range(min = 20, max = 200, message = "舒张压必须在20到200之间"))]
    pub diastolic: u16,

    /// Optional pulse rate in beats per minute
    #[validate(range(min = 20, max = 250, message = "心率必须在20到250之间"))]
    pub pulse: Option<u16>,

    /// Day of the measurement, `YYYY-MM-DD`
    #[schema(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,

    /// Time of the measurement, `HH:MM`
    #[validate(regex(path = "TIME_REGEX", message = "时间格式必须为HH:MM"))]
    #[schema(example = "08:30")]
    pub time: String,

    /// Optional notes
    #[validate(length(max = 1000, message = "备注不能超过1000个字符"))]
    pub notes: Option<String>,
}

impl From<BloodPressureCreateVO> for BloodPressureForm {
    fn from(vo: BloodPressureCreateVO) -> Self {
        Self {
            systolic: vo.systolic,
            diastolic: vo.diastolic,
            pulse: vo.pulse,
            date: vo.date,
            time: vo.time,
            notes: vo.notes,
        }
    }
}

/// Body of `POST /api/blood-pressure/update`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BloodPressureUpdateVO {
    /// Record to update
    pub id: i64,

    #[validate(range(min = 40, max = 300, message = "收缩压必须在40到300之间"))]
    pub systolic: u16,

    #[validate(range(min = 20, max = 200, message = "舒张压必须在20到200之间"))]
    pub diastolic: u16,

    #[validate(range(min = 20, max = 250, message = "心率必须在20到250之间"))]
    pub pulse: Option<u16>,

    #[schema(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,

    #[validate(regex(path = "TIME_REGEX", message = "时间格式必须为HH:MM"))]
    #[schema(example = "08:30")]
    pub time: String,

    #[validate(length(max = 1000, message = "备注不能超过1000个字符"))]
    pub notes: Option<String>,
}

impl From<BloodPressureUpdateVO> for UpdateBloodPressureForm {
    fn from(vo: BloodPressureUpdateVO) -> Self {
        Self {
            id: vo.id,
            form: BloodPressureForm {
                systolic: vo.systolic,
                diastolic: vo.diastolic,
                pulse: vo.pulse,
                date: vo.date,
                time: vo.time,
                notes: vo.notes,
            },
        }
    }
}

/// Query of `GET /api/blood-pressure/delete`
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordIdQuery {
    /// Record id
    pub id: i64,
}

/// Query of `GET /api/blood-pressure/get`
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordDateQuery {
    /// Day to list, `YYYY-MM-DD`
    #[param(value_type = String, example = "2024-03-01")]
    pub date: NaiveDate,
}
