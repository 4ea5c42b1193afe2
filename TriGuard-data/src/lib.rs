// TriGuard Data
// This crate handles data access: the SQLite pool, the mappers over it and
// the short-lived verification code cache

// Database connection management
pub mod database;

// Mapper implementations for data access
pub mod repository;

// Data storage models
pub mod models;

// Expiring key/value state for verification codes and request limits
pub mod cache;
