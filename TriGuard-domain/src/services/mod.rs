// Domain services
// This module contains business logic implementations.
pub mod account;
pub mod blood_pressure;
pub mod category;

// Re-export service traits and factory functions
pub use account::{AccountService, AccountServiceError, AccountServiceTrait};
pub use blood_pressure::{
    create_default_blood_pressure_service, BloodPressureService, BloodPressureServiceError,
    BloodPressureServiceTrait,
};
