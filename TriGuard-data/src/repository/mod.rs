// Mapper module structure
pub mod errors;
pub mod base;
pub mod account;
pub mod blood_pressure;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use base::BaseMapper;
pub use account::{AccountMapper, SqliteAccountMapper};
pub use blood_pressure::{BloodPressureMapper, SqliteBloodPressureMapper};
