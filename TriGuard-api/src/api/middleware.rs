use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use triguard_domain::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use triguard_domain::auth::TokenManager;

use crate::entities::RestResponse;

pub const UNAUTHORIZED_MESSAGE: &str = "未登录或登录已失效";

/// Resolve the caller from `Authorization: Bearer <token>`
///
/// On success the [`AuthenticatedAccount`](triguard_domain::auth::AuthenticatedAccount)
/// is stored in the request extensions. Otherwise a 401 envelope is
/// returned and the handler never runs.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenManager>>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();

    let token = match bearer_token(&req) {
        Some(token) => token,
        None => {
            debug!("Missing bearer token on {}", path);
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenValidation, None, false)
                    .with_details(format!("Missing bearer token on {}", path)),
            );
            return unauthorized();
        }
    };

    match tokens.validate_token(&token) {
        Ok(account) => {
            debug!("Authenticated account {} on {}", account.id, path);
            req.extensions_mut().insert(account);
            next.run(req).await
        }
        Err(e) => {
            log_auth_event(
                AuthEvent::new(AuthEventType::TokenValidation, None, false)
                    .with_details(format!("{} on {}", e, path)),
            );
            unauthorized()
        }
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn unauthorized() -> Response {
    RestResponse::<()>::failure(401, UNAUTHORIZED_MESSAGE).into_response()
}
