use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use triguard_data::cache::{CodeCache, CodeCheck, FlowLimiter};
use triguard_data::models::Account;
use triguard_data::repository::{AccountMapper, RepositoryError};

use crate::auth::logging::{log_auth_event, log_failed_login, log_successful_login, AuthEvent, AuthEventType};
use crate::auth::password::{hash_password, verify_password};
use crate::config::VerificationConfig;
use crate::entities::account::{
    AccountIdentity, CodeType, ConfirmResetForm, EmailRegisterForm, EmailResetForm,
};
use crate::entities::conversions;
use crate::messaging::{compose_message, CodeSender};

/// Role given to every self-registered account
pub const DEFAULT_ROLE: &str = "user";

/// Account service errors. The display text is shown to the caller as is.
#[derive(Debug, Error)]
pub enum AccountServiceError {
    #[error("请求频繁，请稍后再试")]
    RateLimited,

    #[error("该邮箱已注册")]
    EmailRegistered,

    #[error("邮箱未注册")]
    EmailNotRegistered,

    #[error("该手机号已注册")]
    PhoneRegistered,

    #[error("手机号未注册")]
    PhoneNotRegistered,

    #[error("请先获取验证码")]
    CodeMissing,

    #[error("验证码错误，请重新输入")]
    CodeMismatch,

    #[error("该用户名已被他人使用，请重新更换")]
    UsernameTaken,

    #[error("更新失败，请联系管理员")]
    UpdateFailed,

    #[error("用户名或密码错误")]
    BadCredentials,

    #[error("验证码发送失败，请稍后再试")]
    DeliveryFailed,

    /// Storage or hashing failure; the detail is only logged
    #[error("内部错误，请联系管理员")]
    Internal(String),
}

impl From<RepositoryError> for AccountServiceError {
    fn from(err: RepositoryError) -> Self {
        error!("Account storage error: {}", err);
        AccountServiceError::Internal(err.to_string())
    }
}

/// Trait for account operations
#[async_trait]
pub trait AccountServiceTrait: Send + Sync {
    /// Issue an e-mail verification code for registration or password reset
    async fn send_email_verification_code(
        &self,
        code_type: CodeType,
        email: &str,
        ip: &str,
    ) -> Result<(), AccountServiceError>;

    /// Issue an SMS verification code for registration or password reset
    async fn send_phone_verification_code(
        &self,
        code_type: CodeType,
        phone: &str,
        ip: &str,
    ) -> Result<(), AccountServiceError>;

    /// Create an account from a verified e-mail
    async fn register_email_account(&self, form: EmailRegisterForm) -> Result<(), AccountServiceError>;

    /// Check a reset code without consuming it
    async fn email_confirm_reset(&self, form: ConfirmResetForm) -> Result<(), AccountServiceError>;

    /// Replace the password of the account owning a verified e-mail
    async fn reset_email_account_password(&self, form: EmailResetForm) -> Result<(), AccountServiceError>;

    /// Check credentials. `username` may also be the account e-mail.
    async fn authenticate(&self, username: &str, password: &str) -> Result<AccountIdentity, AccountServiceError>;
}

/// Cache key of the pending code for an e-mail address
pub(crate) fn email_code_key(email: &str) -> String {
    format!("verify:email:data:{}", email)
}

/// Cache key of the pending code for a phone number
pub(crate) fn phone_code_key(phone: &str) -> String {
    format!("verify:phone:data:{}", phone)
}

fn email_limit_key(ip: &str) -> String {
    format!("verify:email:limit:{}", ip)
}

fn phone_limit_key(ip: &str) -> String {
    format!("verify:phone:limit:{}", ip)
}

fn generate_code() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", value)
}

/// Account service backed by an [`AccountMapper`]
pub struct AccountService {
    accounts: Arc<dyn AccountMapper>,
    sender: Arc<dyn CodeSender>,
    codes: CodeCache,
    limiter: FlowLimiter,
    config: VerificationConfig,
}

impl AccountService {
    /// Create a service with its own code cache and flow limiter
    pub fn new(
        accounts: Arc<dyn AccountMapper>,
        sender: Arc<dyn CodeSender>,
        config: VerificationConfig,
    ) -> Self {
        Self {
            accounts,
            sender,
            codes: CodeCache::new(),
            limiter: FlowLimiter::new(config.cooldown),
            config,
        }
    }

    /// Use an externally owned code cache
    pub fn with_code_cache(mut self, codes: CodeCache) -> Self {
        self.codes = codes;
        self
    }

    /// Periodically forget elapsed request windows
    pub fn start_cleanup_task(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        let limiter = self.limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let removed = limiter.prune();
                debug!("Pruned {} request windows, {} remain", removed, limiter.len());
            }
        })
    }

    fn admit(&self, limit_key: &str) -> Result<(), AccountServiceError> {
        if self.limiter.try_acquire(limit_key) {
            Ok(())
        } else {
            Err(AccountServiceError::RateLimited)
        }
    }

    async fn check_code(&self, key: &str, code: &str) -> Result<(), AccountServiceError> {
        match self.codes.verify(key, code, self.config.max_attempts).await? {
            CodeCheck::Matched => Ok(()),
            CodeCheck::Missing => Err(AccountServiceError::CodeMissing),
            CodeCheck::Mismatch => Err(AccountServiceError::CodeMismatch),
            CodeCheck::Exhausted => {
                log_auth_event(
                    AuthEvent::new(AuthEventType::VerificationCode, None, false)
                        .with_details(format!("code under {} discarded after repeated mismatches", key)),
                );
                Err(AccountServiceError::CodeMismatch)
            }
        }
    }

    fn map_duplicate(detail: &str) -> AccountServiceError {
        if detail.contains("email") {
            AccountServiceError::EmailRegistered
        } else if detail.contains("username") {
            AccountServiceError::UsernameTaken
        } else if detail.contains("phone") {
            AccountServiceError::PhoneRegistered
        } else {
            AccountServiceError::Internal(detail.to_string())
        }
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    async fn send_email_verification_code(
        &self,
        code_type: CodeType,
        email: &str,
        ip: &str,
    ) -> Result<(), AccountServiceError> {
        let registered = self.accounts.exists_by_email(email).await?;
        match code_type {
            CodeType::Register if registered => return Err(AccountServiceError::EmailRegistered),
            CodeType::Reset if !registered => return Err(AccountServiceError::EmailNotRegistered),
            _ => {}
        }

        let limit_key = email_limit_key(ip);
        self.admit(&limit_key)?;

        let code = generate_code();
        let key = email_code_key(email);
        if let Err(e) = self.codes.put(&key, &code, self.config.code_ttl).await {
            self.limiter.release(&limit_key);
            return Err(e.into());
        }

        let message = compose_message(code_type, &code, self.config.ttl_minutes());
        if let Err(e) = self.sender.send_email(email, &message).await {
            warn!("Failed to deliver e-mail code to {}: {}", email, e);
            self.limiter.release(&limit_key);
            self.codes.remove(&key).await?;
            return Err(AccountServiceError::DeliveryFailed);
        }

        log_auth_event(
            AuthEvent::new(AuthEventType::VerificationCode, Some(email), true)
                .with_ip(ip)
                .with_details(code_type.to_string()),
        );
        Ok(())
    }

    async fn send_phone_verification_code(
        &self,
        code_type: CodeType,
        phone: &str,
        ip: &str,
    ) -> Result<(), AccountServiceError> {
        let registered = self.accounts.exists_by_phone(phone).await?;
        match code_type {
            CodeType::Register if registered => return Err(AccountServiceError::PhoneRegistered),
            CodeType::Reset if !registered => return Err(AccountServiceError::PhoneNotRegistered),
            _ => {}
        }

        let limit_key = phone_limit_key(ip);
        self.admit(&limit_key)?;

        let code = generate_code();
        let key = phone_code_key(phone);
        if let Err(e) = self.codes.put(&key, &code, self.config.code_ttl).await {
            self.limiter.release(&limit_key);
            return Err(e.into());
        }

        let message = compose_message(code_type, &code, self.config.ttl_minutes());
        if let Err(e) = self.sender.send_sms(phone, &message).await {
            warn!("Failed to deliver SMS code to {}: {}", phone, e);
            self.limiter.release(&limit_key);
            self.codes.remove(&key).await?;
            return Err(AccountServiceError::DeliveryFailed);
        }

        log_auth_event(
            AuthEvent::new(AuthEventType::VerificationCode, Some(phone), true)
                .with_ip(ip)
                .with_details(code_type.to_string()),
        );
        Ok(())
    }

    async fn register_email_account(&self, form: EmailRegisterForm) -> Result<(), AccountServiceError> {
        let key = email_code_key(&form.email);
        self.check_code(&key, &form.code).await?;

        if self.accounts.exists_by_email(&form.email).await? {
            return Err(AccountServiceError::EmailRegistered);
        }
        if self.accounts.exists_by_username(&form.username).await? {
            return Err(AccountServiceError::UsernameTaken);
        }

        let password = hash_password(&form.password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            AccountServiceError::Internal(e.to_string())
        })?;

        let account = Account {
            id: 0,
            username: form.username,
            password,
            email: form.email,
            phone: None,
            role: DEFAULT_ROLE.to_string(),
            register_time: Utc::now(),
        };

        let stored = match self.accounts.insert(account).await {
            Ok(stored) => stored,
            Err(RepositoryError::Duplicate(detail)) => return Err(Self::map_duplicate(&detail)),
            Err(e) => return Err(e.into()),
        };

        self.codes.remove(&key).await?;

        info!("Registered account {} ({})", stored.id, stored.username);
        log_auth_event(AuthEvent::new(AuthEventType::Registration, Some(&stored.username), true));
        Ok(())
    }

    async fn email_confirm_reset(&self, form: ConfirmResetForm) -> Result<(), AccountServiceError> {
        self.check_code(&email_code_key(&form.email), &form.code).await
    }

    async fn reset_email_account_password(&self, form: EmailResetForm) -> Result<(), AccountServiceError> {
        let key = email_code_key(&form.email);
        self.check_code(&key, &form.code).await?;

        let password = hash_password(&form.password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            AccountServiceError::Internal(e.to_string())
        })?;

        if !self.accounts.update_password_by_email(&form.email, &password).await? {
            warn!("Password reset matched no account for {}", form.email);
            return Err(AccountServiceError::UpdateFailed);
        }

        self.codes.remove(&key).await?;

        log_auth_event(AuthEvent::new(AuthEventType::PasswordReset, Some(&form.email), true));
        Ok(())
    }

    async fn authenticate(&self, username: &str, password: &str) -> Result<AccountIdentity, AccountServiceError> {
        let account = match self.accounts.find_by_username_or_email(username).await? {
            Some(account) => account,
            None => {
                log_failed_login(username, "unknown account");
                return Err(AccountServiceError::BadCredentials);
            }
        };

        if !verify_password(password, &account.password) {
            log_failed_login(username, "wrong password");
            return Err(AccountServiceError::BadCredentials);
        }

        log_successful_login(&account.username);
        Ok(conversions::convert_to_domain_identity(&account))
    }
}
