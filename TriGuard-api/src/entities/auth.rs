use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use triguard_domain::entities::account::{
    CodeType, ConfirmResetForm, EmailRegisterForm, EmailResetForm,
};

/// Mainland China mobile numbers
pub static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1[3-9]\d{9}$").expect("valid phone pattern"));

/// Letters, digits and CJK ideographs only
pub static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9\x{4e00}-\x{9fa5}]+$").expect("valid username pattern")
});

/// Query of `GET /api/auth/email-code`
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailCodeQuery {
    /// Address to send the code to
    #[validate(email(message = "请输入合法的电子邮件地址"))]
    pub email: String,

    /// `register` or `reset`
    #[serde(rename = "type")]
    #[param(value_type = String, example = "register")]
    pub code_type: CodeType,
}

/// Query of `GET /api/auth/phone-code`
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhoneCodeQuery {
    /// Mobile number to send the code to
    #[validate(regex(path = "PHONE_REGEX", message = "请输入合法的手机号"))]
    pub phone: String,

    /// `register` or `reset`
    #[serde(rename = "type")]
    #[param(value_type = String, example = "register")]
    pub code_type: CodeType,
}

/// Registration by e-mail
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EmailRegisterVO {
    /// E-mail the code was sent to
    #[validate(email(message = "请输入合法的电子邮件地址"))]
    pub email: String,

    /// Six character verification code
    #[validate(length(equal = 6, message = "验证码长度必须为6位"))]
    pub code: String,

    /// Display name, letters, digits or Chinese characters
    #[validate(
        length(min = 1, max = 10, message = "用户名长度必须在1到10个字符之间"),
        regex(path = "USERNAME_REGEX", message = "用户名只能包含字母、数字或中文")
    )]
    pub username: String,

    /// Plain password
    #[validate(length(min = 6, max = 20, message = "密码长度必须在6到20个字符之间"))]
    pub password: String,
}

impl From<EmailRegisterVO> for EmailRegisterForm {
    fn from(vo: EmailRegisterVO) -> Self {
        Self {
            email: vo.email,
            code: vo.code,
            username: vo.username,
            password: vo.password,
        }
    }
}

/// Reset confirmation, checks the code only
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EmailConfirmResetVO {
    #[validate(email(message = "请输入合法的电子邮件地址"))]
    pub email: String,

    #[validate(length(equal = 6, message = "验证码长度必须为6位"))]
    pub code: String,
}

impl From<EmailConfirmResetVO> for ConfirmResetForm {
    fn from(vo: EmailConfirmResetVO) -> Self {
        Self {
            email: vo.email,
            code: vo.code,
        }
    }
}

/// Password reset
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EmailResetVO {
    #[validate(email(message = "请输入合法的电子邮件地址"))]
    pub email: String,

    #[validate(length(equal = 6, message = "验证码长度必须为6位"))]
    pub code: String,

    /// New plain password
    #[validate(length(min = 6, max = 20, message = "密码长度必须在6到20个字符之间"))]
    pub password: String,
}

impl From<EmailResetVO> for EmailResetForm {
    fn from(vo: EmailResetVO) -> Self {
        Self {
            email: vo.email,
            code: vo.code,
            password: vo.password,
        }
    }
}

/// Login with username or e-mail
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginVO {
    /// Username or e-mail
    #[validate(length(min = 1, message = "用户名不能为空"))]
    pub username: String,

    #[validate(length(min = 1, message = "密码不能为空"))]
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorizeVO {
    pub username: String,
    pub role: String,
    /// Bearer token for the `Authorization` header
    pub token: String,
    /// Token expiry
    pub expire: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_vo() -> EmailRegisterVO {
        EmailRegisterVO {
            email: "a@b.com".to_string(),
            code: "123456".to_string(),
            username: "张三abc".to_string(),
            password: "secret123".to_string(),
        }
    }

    #[test]
    fn test_phone_pattern() {
        assert!(PHONE_REGEX.is_match("13800138000"));
        assert!(PHONE_REGEX.is_match("19912345678"));
        assert!(!PHONE_REGEX.is_match("12800138000"));
        assert!(!PHONE_REGEX.is_match("1380013800"));
        assert!(!PHONE_REGEX.is_match("138001380001"));
    }

    #[test]
    fn test_register_vo_accepts_cjk_username() {
        assert!(register_vo().validate().is_ok());
    }

    #[test]
    fn test_register_vo_rejections() {
        let mut vo = register_vo();
        vo.username = "bad name!".to_string();
        assert!(vo.validate().is_err());

        let mut vo = register_vo();
        vo.username = "abcdefghijk".to_string();
        assert!(vo.validate().is_err());

        let mut vo = register_vo();
        vo.code = "12345".to_string();
        assert!(vo.validate().is_err());

        let mut vo = register_vo();
        vo.password = "short".to_string();
        assert!(vo.validate().is_err());

        let mut vo = register_vo();
        vo.email = "not-an-email".to_string();
        assert!(vo.validate().is_err());
    }

    #[test]
    fn test_code_type_parsing() {
        let query: EmailCodeQuery =
            serde_json::from_value(serde_json::json!({"email": "a@b.com", "type": "reset"})).unwrap();
        assert_eq!(query.code_type, CodeType::Reset);

        let result: Result<EmailCodeQuery, _> =
            serde_json::from_value(serde_json::json!({"email": "a@b.com", "type": "login"}));
        assert!(result.is_err());
    }
}
