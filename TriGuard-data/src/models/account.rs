use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Primary key, assigned on insert
    pub id: i64,

    /// Unique display name
    pub username: String,

    /// Argon2 PHC string, never the plain password
    pub password: String,

    /// Unique e-mail address
    pub email: String,

    /// Optional unique mobile number
    pub phone: Option<String>,

    /// Role name used in issued tokens
    pub role: String,

    /// When the account was created
    pub register_time: DateTime<Utc>,
}
