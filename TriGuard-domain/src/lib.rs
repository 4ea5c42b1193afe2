// TriGuard Domain
// This crate contains the business logic for the TriGuard application

// Services that implement business logic
pub mod services;

// Authentication
pub mod auth;

// Domain entities
pub mod entities;

// Verification code delivery
pub mod messaging;

// Service configuration read from the environment
pub mod config;

// Health checks and system status
pub mod health;

// Re-export the database module from the data crate for convenience
pub use triguard_data::database;

// Testing utilities - only available with mock feature
#[cfg(feature = "mock")]
pub mod testing;
