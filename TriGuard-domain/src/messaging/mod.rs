//! Delivery of verification codes
//!
//! Sending real e-mail or SMS is outside this service. Codes are composed
//! into a message and handed to a [`CodeSender`]; the shipped sender writes
//! the message to the log.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::entities::account::CodeType;

/// Code delivery errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The channel refused or failed to deliver
    #[error("Delivery failed: {0}")]
    Failed(String),
}

/// A composed verification message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMessage {
    pub subject: String,
    pub body: String,
}

/// Compose the message for a code
pub fn compose_message(code_type: CodeType, code: &str, ttl_minutes: u64) -> CodeMessage {
    match code_type {
        CodeType::Register => CodeMessage {
            subject: "欢迎注册TriGuard".to_string(),
            body: format!(
                "您的注册验证码为: {}，有效时间{}分钟，为了保障您的账户安全，请勿向他人泄露验证码信息。",
                code, ttl_minutes
            ),
        },
        CodeType::Reset => CodeMessage {
            subject: "TriGuard密码重置".to_string(),
            body: format!(
                "您好，您正在执行重置密码操作，验证码: {}，有效时间{}分钟，如非本人操作，请无视。",
                code, ttl_minutes
            ),
        },
    }
}

/// Channel that delivers verification messages
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodeSender: Send + Sync {
    /// Deliver a message to an e-mail address
    async fn send_email(&self, email: &str, message: &CodeMessage) -> Result<(), DeliveryError>;

    /// Deliver a message to a phone number
    async fn send_sms(&self, phone: &str, message: &CodeMessage) -> Result<(), DeliveryError>;
}

/// Sender that writes every message to the log
#[derive(Debug, Clone, Default)]
pub struct LoggingCodeSender;

#[async_trait]
impl CodeSender for LoggingCodeSender {
    async fn send_email(&self, email: &str, message: &CodeMessage) -> Result<(), DeliveryError> {
        info!("Mail to {} [{}]: {}", email, message.subject, message.body);
        Ok(())
    }

    async fn send_sms(&self, phone: &str, message: &CodeMessage) -> Result<(), DeliveryError> {
        info!("SMS to {}: {}", phone, message.body);
        Ok(())
    }
}
