pub mod authorization;
pub mod blood_pressure;
pub mod health;

// Re-export handlers for easier imports
pub use authorization::{
    ask_phone_code, ask_verify_code, login, logout, register, reset_confirm, reset_password,
};
pub use blood_pressure::{create_record, delete_record, get_records, update_record};
pub use health::health_check;
