// Domain entities and value objects
pub mod account;
pub mod blood_pressure;
pub mod conversions;

// Re-export common types for easier imports
pub use account::{AccountIdentity, CodeType, ConfirmResetForm, EmailRegisterForm, EmailResetForm};
pub use blood_pressure::{
    BloodPressureCategory, BloodPressureForm, BloodPressureRecord, UpdateBloodPressureForm,
};
