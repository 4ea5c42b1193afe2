use chrono::{DateTime, Utc};
use triguard_data::models;

use crate::entities::account::AccountIdentity;
use crate::entities::blood_pressure::{BloodPressureForm, BloodPressureRecord};
use crate::services::category::categorize_blood_pressure;

// Conversions between domain entities and data models follow the pattern
// convert_to_[target_layer]_[model_name]

/// Convert a stored record into the domain entity, deriving its category
pub fn convert_to_domain_record(record: models::BloodPressureRecord) -> BloodPressureRecord {
    let category = categorize_blood_pressure(record.systolic, record.diastolic);
    BloodPressureRecord {
        id: record.id,
        account_id: record.account_id,
        systolic: record.systolic,
        diastolic: record.diastolic,
        pulse: record.pulse,
        date: record.date,
        time: record.time,
        notes: record.notes,
        create_time: record.create_time,
        category,
    }
}

/// Build the storage model for a new record. The id is assigned on insert.
pub fn convert_to_data_record(
    account_id: i64,
    form: BloodPressureForm,
    create_time: DateTime<Utc>,
) -> models::BloodPressureRecord {
    models::BloodPressureRecord {
        id: 0,
        account_id,
        systolic: form.systolic,
        diastolic: form.diastolic,
        pulse: form.pulse,
        date: form.date,
        time: form.time,
        notes: normalize_notes(form.notes),
        create_time,
    }
}

/// Apply an update form onto an existing stored record, keeping its
/// owner and creation time
pub fn apply_form_to_data_record(
    existing: models::BloodPressureRecord,
    form: BloodPressureForm,
) -> models::BloodPressureRecord {
    models::BloodPressureRecord {
        systolic: form.systolic,
        diastolic: form.diastolic,
        pulse: form.pulse,
        date: form.date,
        time: form.time,
        notes: normalize_notes(form.notes),
        ..existing
    }
}

/// Convert a stored account into the identity returned to callers
pub fn convert_to_domain_identity(account: &models::Account) -> AccountIdentity {
    AccountIdentity {
        id: account.id,
        username: account.username.clone(),
        email: account.email.clone(),
        role: account.role.clone(),
    }
}

// Blank notes are stored as NULL
fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes.filter(|n| !n.trim().is_empty())
}
