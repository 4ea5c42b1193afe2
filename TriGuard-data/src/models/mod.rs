// Storage models, one per table
pub mod account;
pub mod blood_pressure;

pub use account::Account;
pub use blood_pressure::BloodPressureRecord;
