use std::fmt;

use serde::{Deserialize, Serialize};

/// Purpose of a verification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    /// Code for creating an account
    Register,
    /// Code for resetting a password
    Reset,
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeType::Register => write!(f, "register"),
            CodeType::Reset => write!(f, "reset"),
        }
    }
}

/// Registration by e-mail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRegisterForm {
    pub email: String,
    pub code: String,
    pub username: String,
    pub password: String,
}

/// First step of a password reset: check the code only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmResetForm {
    pub email: String,
    pub code: String,
}

/// Second step of a password reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailResetForm {
    pub email: String,
    pub code: String,
    pub password: String,
}

/// Account details returned by a successful authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}
