use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Types of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    /// Successful login
    Login,
    /// Failed login attempt
    FailedLogin,
    /// Logout (token revoked)
    Logout,
    /// Account registration
    Registration,
    /// Password reset
    PasswordReset,
    /// Verification code requested
    VerificationCode,
    /// Bearer token rejected
    TokenValidation,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::Logout => write!(f, "LOGOUT"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::PasswordReset => write!(f, "PASSWORD_RESET"),
            AuthEventType::VerificationCode => write!(f, "VERIFICATION_CODE"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Type of authentication event
    pub event_type: AuthEventType,
    /// Username, e-mail or phone the event concerns
    pub subject: Option<String>,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// Client IP address
    pub ip_address: Option<String>,
    /// Whether the event was successful
    pub success: bool,
    /// Additional details
    pub details: Option<String>,
}

impl AuthEvent {
    /// Create a new authentication event
    pub fn new(event_type: AuthEventType, subject: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            subject: subject.map(String::from),
            timestamp: Utc::now(),
            ip_address: None,
            success,
            details: None,
        }
    }

    /// Set the IP address
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Write an authentication event to the log
pub fn log_auth_event(event: AuthEvent) {
    let subject = event.subject.as_deref().unwrap_or("anonymous");
    let ip = event.ip_address.as_deref().unwrap_or("-");
    let details = event.details.as_deref().unwrap_or("");

    if event.success {
        info!(
            "AUTH-LOG [{}] [{}] [{}] [SUCCESS] [{}] {}",
            event.event_type,
            subject,
            ip,
            event.timestamp.to_rfc3339(),
            details
        );
    } else {
        warn!(
            "AUTH-LOG [{}] [{}] [{}] [FAILURE] [{}] {}",
            event.event_type,
            subject,
            ip,
            event.timestamp.to_rfc3339(),
            details
        );
    }
}

/// Log a successful login
pub fn log_successful_login(username: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::Login, Some(username), true));
}

/// Log a failed login attempt
pub fn log_failed_login(username: &str, reason: &str) {
    log_auth_event(
        AuthEvent::new(AuthEventType::FailedLogin, Some(username), false).with_details(reason),
    );
}

/// Log a logout
pub fn log_logout(username: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::Logout, Some(username), true));
}
