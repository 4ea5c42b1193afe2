use std::sync::Arc;

use axum::{extract::State, Extension};
use tracing::{error, info, instrument};

use triguard_domain::auth::logging::log_logout;
use triguard_domain::auth::{AuthenticatedAccount, TokenManager};

use crate::api::extract::{ClientIp, ValidatedJson, ValidatedQuery};
use crate::api::routes::AccountServiceRef;
use crate::entities::auth::{
    AuthorizeVO, EmailCodeQuery, EmailConfirmResetVO, EmailRegisterVO, EmailResetVO, LoginVO,
    PhoneCodeQuery,
};
use crate::entities::{message_handle, RestResponse};

/// Send a verification code to an e-mail address
#[utoipa::path(
    get,
    path = "/api/auth/email-code",
    params(EmailCodeQuery),
    responses(
        (status = 200, description = "Code sent", body = RestResponse),
        (status = 400, description = "Invalid input or request refused", body = RestResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service))]
pub async fn ask_verify_code(
    State(service): State<AccountServiceRef>,
    ClientIp(ip): ClientIp,
    ValidatedQuery(query): ValidatedQuery<EmailCodeQuery>,
) -> RestResponse<()> {
    info!("Verification code requested for {} ({})", query.email, query.code_type);
    message_handle(
        service
            .send_email_verification_code(query.code_type, &query.email, &ip)
            .await,
    )
}

/// Send a verification code to a phone number
#[utoipa::path(
    get,
    path = "/api/auth/phone-code",
    params(PhoneCodeQuery),
    responses(
        (status = 200, description = "Code sent", body = RestResponse),
        (status = 400, description = "Invalid input or request refused", body = RestResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service))]
pub async fn ask_phone_code(
    State(service): State<AccountServiceRef>,
    ClientIp(ip): ClientIp,
    ValidatedQuery(query): ValidatedQuery<PhoneCodeQuery>,
) -> RestResponse<()> {
    info!("Verification code requested for phone ({})", query.code_type);
    message_handle(
        service
            .send_phone_verification_code(query.code_type, &query.phone, &ip)
            .await,
    )
}

/// Register an account with an e-mail verification code
#[utoipa::path(
    post,
    path = "/api/auth/email-register",
    request_body = EmailRegisterVO,
    responses(
        (status = 200, description = "Account created", body = RestResponse),
        (status = 400, description = "Invalid input or registration refused", body = RestResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service, vo), fields(email = %vo.email, username = %vo.username))]
pub async fn register(
    State(service): State<AccountServiceRef>,
    ValidatedJson(vo): ValidatedJson<EmailRegisterVO>,
) -> RestResponse<()> {
    message_handle(service.register_email_account(vo.into()).await)
}

/// Check a password reset code without consuming it
#[utoipa::path(
    post,
    path = "/api/auth/reset-confirm",
    request_body = EmailConfirmResetVO,
    responses(
        (status = 200, description = "Code accepted", body = RestResponse),
        (status = 400, description = "Invalid input or wrong code", body = RestResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service, vo), fields(email = %vo.email))]
pub async fn reset_confirm(
    State(service): State<AccountServiceRef>,
    ValidatedJson(vo): ValidatedJson<EmailConfirmResetVO>,
) -> RestResponse<()> {
    message_handle(service.email_confirm_reset(vo.into()).await)
}

/// Set a new password with a reset code
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = EmailResetVO,
    responses(
        (status = 200, description = "Password changed", body = RestResponse),
        (status = 400, description = "Invalid input or reset refused", body = RestResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service, vo), fields(email = %vo.email))]
pub async fn reset_password(
    State(service): State<AccountServiceRef>,
    ValidatedJson(vo): ValidatedJson<EmailResetVO>,
) -> RestResponse<()> {
    message_handle(service.reset_email_account_password(vo.into()).await)
}

/// Log in with username or e-mail and receive a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginVO,
    responses(
        (status = 200, description = "Logged in, `data` carries the token", body = RestResponse),
        (status = 400, description = "Invalid credentials", body = RestResponse),
        (status = 500, description = "Token could not be issued", body = RestResponse),
    ),
    tag = "auth"
)]
#[instrument(skip(service, tokens, vo), fields(username = %vo.username))]
pub async fn login(
    State(service): State<AccountServiceRef>,
    State(tokens): State<Arc<TokenManager>>,
    ValidatedJson(vo): ValidatedJson<LoginVO>,
) -> RestResponse<AuthorizeVO> {
    let identity = match service.authenticate(&vo.username, &vo.password).await {
        Ok(identity) => identity,
        Err(e) => return RestResponse::failure(400, e.to_string()),
    };

    match tokens.generate_token(identity.id, &identity.username, &identity.role) {
        Ok(issued) => RestResponse::success(AuthorizeVO {
            username: identity.username,
            role: identity.role,
            token: issued.token,
            expire: issued.expire,
        }),
        Err(e) => {
            error!("Failed to issue token for account {}: {}", identity.id, e);
            RestResponse::failure(500, "内部错误，请联系管理员")
        }
    }
}

/// Revoke the bearer token of the current request
#[utoipa::path(
    get,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = RestResponse),
        (status = 401, description = "Missing or invalid token", body = RestResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "auth"
)]
#[instrument(skip(tokens, account), fields(account_id = account.id))]
pub async fn logout(
    State(tokens): State<Arc<TokenManager>>,
    Extension(account): Extension<AuthenticatedAccount>,
) -> RestResponse<()> {
    tokens.revoke_token(&account.jti, account.exp);
    log_logout(&account.username);
    RestResponse::success_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use triguard_domain::auth::JwtConfig;
    use triguard_domain::entities::account::{AccountIdentity, EmailRegisterForm};
    use triguard_domain::services::AccountServiceError;
    use triguard_domain::testing::{
        AccountCall, MockAccountService, MockBloodPressureService, MockHealthService,
    };

    use crate::api::routes::{create_app, AppState};

    fn app_with(accounts: Arc<MockAccountService>) -> (Router, Arc<TokenManager>) {
        let tokens = Arc::new(TokenManager::new(JwtConfig {
            secret: "authorization_test_secret".to_string(),
            issuer: "triguard-test".to_string(),
            expiration_hours: 2,
        }));
        let state = AppState {
            account_service: accounts,
            blood_pressure_service: Arc::new(MockBloodPressureService::new()),
            health_service: Arc::new(MockHealthService::new()),
            token_manager: tokens.clone(),
            trusted_proxies: Default::default(),
        };
        (create_app(state), tokens)
    }

    async fn post_json(router: Router, uri: &str, body: Value) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_register_passes_form_to_service() {
        let accounts = Arc::new(MockAccountService::new());
        let (router, _) = app_with(accounts.clone());

        let response = post_json(
            router,
            "/api/auth/email-register",
            json!({"email": "a@b.com", "code": "123456", "username": "小明abc", "password": "secret1"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"code": 200, "msg": null, "data": null}));
        assert_eq!(
            accounts.calls(),
            vec![AccountCall::Register(EmailRegisterForm {
                email: "a@b.com".to_string(),
                code: "123456".to_string(),
                username: "小明abc".to_string(),
                password: "secret1".to_string(),
            })]
        );
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_form() {
        for body in [
            json!({"email": "a@b.com", "code": "12345", "username": "bob", "password": "secret1"}),
            json!({"email": "a@b.com", "code": "123456", "username": "bob!", "password": "secret1"}),
            json!({"email": "a@b.com", "code": "123456", "username": "abcdefghijk", "password": "secret1"}),
            json!({"email": "a@b.com", "code": "123456", "username": "bob", "password": "12345"}),
            json!({"email": "a@b.com", "code": "123456", "username": "bob"}),
        ] {
            let accounts = Arc::new(MockAccountService::new());
            let (router, _) = app_with(accounts.clone());

            let response = post_json(router, "/api/auth/email-register", body.clone()).await;

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            assert!(accounts.calls().is_empty(), "{}", body);
        }
    }

    #[tokio::test]
    async fn test_reset_password_failure_message_is_verbatim() {
        let accounts =
            Arc::new(MockAccountService::new().failing_with(|| AccountServiceError::CodeMismatch));
        let (router, _) = app_with(accounts);

        let response = post_json(
            router,
            "/api/auth/reset-password",
            json!({"email": "a@b.com", "code": "000000", "password": "newpass1"}),
        )
        .await;

        assert_eq!(
            body_json(response).await,
            json!({"code": 400, "msg": "验证码错误，请重新输入", "data": null})
        );
    }

    #[tokio::test]
    async fn test_login_returns_token() {
        let accounts = Arc::new(MockAccountService::new().with_identity(AccountIdentity {
            id: 9,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: "user".to_string(),
        }));
        let (router, tokens) = app_with(accounts);

        let response = post_json(
            router,
            "/api/auth/login",
            json!({"username": "alice@example.com", "password": "secret1"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["username"], "alice");
        assert_eq!(body["data"]["role"], "user");

        let token = body["data"]["token"].as_str().unwrap();
        assert_eq!(tokens.validate_token(token).unwrap().id, 9);
    }

    #[tokio::test]
    async fn test_login_with_bad_credentials() {
        let accounts =
            Arc::new(MockAccountService::new().failing_with(|| AccountServiceError::BadCredentials));
        let (router, _) = app_with(accounts);

        let response = post_json(
            router,
            "/api/auth/login",
            json!({"username": "alice", "password": "wrong"}),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"code": 400, "msg": "用户名或密码错误", "data": null})
        );
    }

    #[tokio::test]
    async fn test_logout_requires_token() {
        let (router, _) = app_with(Arc::new(MockAccountService::new()));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/auth/logout")
                    .header("authorization", "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
