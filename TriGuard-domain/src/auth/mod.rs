//! Authentication building blocks for the TriGuard API
//!
//! Password hashing, JWT issuance and validation, token revocation and an
//! audit log of authentication events. The HTTP middleware that uses these
//! lives in the API crate.

use serde::{Deserialize, Serialize};

// JWT issuance and validation
pub mod token;

// Token revocation list
pub mod token_blacklist;

// Argon2 password hashing
pub mod password;

// Authentication audit log
pub mod logging;

pub use token::{IssuedToken, JwtConfig, SecurityError, TokenManager};

/// Claims carried by every token this service issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    /// Username at issue time
    pub name: String,
    /// Account role
    pub role: String,
    /// Issuer
    pub iss: String,
    /// Issued at (as timestamp)
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Unique token id, the key used for revocation
    pub jti: String,
}

/// Caller identity resolved from a valid bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount {
    /// Account id
    pub id: i64,
    /// Username
    pub username: String,
    /// Role
    pub role: String,
    /// Token id
    pub jti: String,
    /// Token expiry as a unix timestamp
    pub exp: i64,
}
