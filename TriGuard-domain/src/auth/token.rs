use std::env;
use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::token_blacklist::TokenBlacklist;
use super::{AuthenticatedAccount, Claims};

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    /// JWT validation error
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    /// Expired token
    #[error("Token has expired")]
    TokenExpired,

    /// Invalid token structure
    #[error("Invalid token format")]
    InvalidToken,

    /// Configuration error
    #[error("Security configuration error: {0}")]
    ConfigError(String),

    /// Token has been revoked
    #[error("Token has been revoked")]
    TokenRevoked,

    /// Token could not be created
    #[error("Token encoding error: {0}")]
    Encoding(String),
}

/// JWT settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,
    /// Value of the `iss` claim
    pub issuer: String,
    /// Token lifetime in hours
    pub expiration_hours: i64,
}

impl JwtConfig {
    /// Load JWT settings from the environment. `JWT_SECRET` is required.
    pub fn from_env() -> Result<Self, SecurityError> {
        let secret = env::var("JWT_SECRET").map_err(|e| {
            error!("JWT_SECRET environment variable not found: {}", e);
            SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
        })?;

        if secret.is_empty() {
            return Err(SecurityError::ConfigError("JWT_SECRET must not be empty".to_string()));
        }

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "triguard-api".to_string());

        let expiration_hours = env::var("JWT_EXPIRATION_HOURS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|hours| *hours > 0)
            .unwrap_or(72);

        Ok(Self {
            secret,
            issuer,
            expiration_hours,
        })
    }
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Encoded JWT
    pub token: String,
    /// Expiry instant
    pub expire: DateTime<Utc>,
}

/// Signs, validates and revokes tokens
#[derive(Debug, Clone)]
pub struct TokenManager {
    config: JwtConfig,
    blacklist: TokenBlacklist,
}

impl TokenManager {
    /// Create a manager with an empty revocation list
    pub fn new(config: JwtConfig) -> Self {
        Self {
            config,
            blacklist: TokenBlacklist::new(),
        }
    }

    /// Issue a token for an account
    pub fn generate_token(
        &self,
        account_id: i64,
        username: &str,
        role: &str,
    ) -> Result<IssuedToken, SecurityError> {
        let now = Utc::now();
        let expiration = now + Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            sub: account_id.to_string(),
            name: username.to_string(),
            role: role.to_string(),
            iss: self.config.issuer.clone(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| {
            error!("Failed to encode JWT token: {}", e);
            SecurityError::Encoding(e.to_string())
        })?;

        // Never log the token itself
        info!("Generated token for account {}", account_id);
        debug!("Token expiration: {}", expiration);

        Ok(IssuedToken {
            token,
            expire: expiration,
        })
    }

    /// Validate a token and resolve the caller it was issued to
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedAccount, SecurityError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[self.config.issuer.as_str()]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
            jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
            jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                SecurityError::TokenValidation("Invalid signature".to_string())
            }
            _ => SecurityError::TokenValidation(e.to_string()),
        })?;

        let claims = token_data.claims;

        if self.blacklist.is_revoked(&claims.jti) {
            debug!("Rejected revoked token {}", claims.jti);
            return Err(SecurityError::TokenRevoked);
        }

        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| SecurityError::InvalidToken)?;

        Ok(AuthenticatedAccount {
            id,
            username: claims.name,
            role: claims.role,
            jti: claims.jti,
            exp: claims.exp,
        })
    }

    /// Revoke a token until it would have expired anyway
    pub fn revoke_token(&self, jti: &str, exp: i64) {
        info!("Revoking token {}", jti);
        let expiration = UNIX_EPOCH + StdDuration::from_secs(exp.max(0) as u64);
        let expiration = expiration.max(SystemTime::now());
        self.blacklist.revoke_token(jti, expiration);
    }

    /// Spawn a task that prunes the revocation list every `period`.
    /// Must be called from within a tokio runtime.
    pub fn start_cleanup_task(&self, period: StdDuration) -> tokio::task::JoinHandle<()> {
        let blacklist = self.blacklist.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = blacklist.cleanup_expired_tokens();
                debug!(
                    "Removed {} expired tokens, {} remain in blacklist",
                    removed,
                    blacklist.size()
                );
            }
        })
    }
}
