// Public entities for the TriGuard API
// Request and response shapes exchanged over HTTP

// Response envelope
pub mod common;

// Authorization request/response objects
pub mod auth;

// Blood pressure request/response objects
pub mod blood_pressure;

pub use common::{message_handle, RestResponse};
