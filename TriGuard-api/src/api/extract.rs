use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, HeaderMap},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use validator::{Validate, ValidationErrors};

use crate::entities::RestResponse;

/// JSON body that has been deserialized and validated
///
/// Rejects with a 400 envelope before the handler runs.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = RestResponse<()>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            debug!("Rejected JSON body: {}", rejection.body_text());
            RestResponse::failure(400, rejection.body_text())
        })?;

        value.validate().map_err(validation_failure)?;
        Ok(Self(value))
    }
}

/// Query string that has been deserialized and validated
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = RestResponse<()>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                debug!("Rejected query: {}", rejection.body_text());
                RestResponse::failure(400, rejection.body_text())
            })?;

        value.validate().map_err(validation_failure)?;
        Ok(Self(value))
    }
}

/// Field messages ordered by field name and joined with `; `
fn validation_failure(errors: ValidationErrors) -> RestResponse<()> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    let msg = fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{}: {}", field, error.code),
            })
        })
        .collect::<Vec<_>>()
        .join("; ");

    debug!("Validation failed: {}", msg);
    RestResponse::failure(400, msg)
}

/// Reverse proxies whose forwarding headers are believed
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<Vec<IpAddr>>);

impl TrustedProxies {
    pub fn new(proxies: Vec<IpAddr>) -> Self {
        Self(Arc::new(proxies))
    }

    /// Read the comma separated `TRUSTED_PROXIES` list. Unparsable entries
    /// are skipped with a warning; an unset variable trusts nobody.
    pub fn from_env() -> Self {
        let proxies = std::env::var("TRUSTED_PROXIES")
            .map(|value| parse_proxy_list(&value))
            .unwrap_or_default();
        debug!("Trusting forwarding headers from {} proxies", proxies.len());
        Self::new(proxies)
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

fn parse_proxy_list(value: &str) -> Vec<IpAddr> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<IpAddr>() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!("Ignoring invalid TRUSTED_PROXIES entry: {}", entry);
                None
            }
        })
        .collect()
}

/// Address of the calling client
///
/// The socket peer, unless the peer is a trusted proxy, in which case the
/// nearest untrusted `X-Forwarded-For` hop (or `X-Real-IP`) is used.
/// `"unknown"` when the peer address is not available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    TrustedProxies: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(peer) = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
        else {
            return Ok(Self("unknown".to_string()));
        };

        let proxies = TrustedProxies::from_ref(state);
        if proxies.contains(&peer) {
            if let Some(ip) = forwarded_ip(&parts.headers, &proxies) {
                return Ok(Self(ip.to_string()));
            }
        }

        Ok(Self(peer.to_string()))
    }
}

fn forwarded_ip(headers: &HeaderMap, proxies: &TrustedProxies) -> Option<IpAddr> {
    let hops: Vec<IpAddr> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|hop| hop.trim().parse::<IpAddr>().ok())
        .collect();

    // Walk back from the hop our proxy saw; earlier entries are client supplied
    if let Some(ip) = hops.iter().rev().find(|ip| !proxies.contains(ip)) {
        return Some(*ip);
    }
    if let Some(ip) = hops.first() {
        return Some(*ip);
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<IpAddr>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request as HttpRequest};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Sample {
        #[validate(email(message = "请输入合法的电子邮件地址"))]
        email: String,
        #[validate(length(min = 6, message = "密码太短"))]
        password: String,
    }

    fn parts_for(uri: &str, headers: &[(&'static str, &'static str)]) -> Parts {
        let mut builder = HttpRequest::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, HeaderValue::from_static(value));
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_validated_query_accepts_valid_input() {
        let mut parts = parts_for("/?email=a@b.com&password=secret1", &[]);
        let ValidatedQuery(sample) = ValidatedQuery::<Sample>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(sample.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_validation_messages_are_ordered_by_field() {
        let mut parts = parts_for("/?email=nope&password=123", &[]);
        let rejection = ValidatedQuery::<Sample>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();

        assert_eq!(rejection.code, 400);
        assert_eq!(rejection.msg.as_deref(), Some("请输入合法的电子邮件地址; 密码太短"));
    }

    #[tokio::test]
    async fn test_missing_query_field_is_rejected() {
        let mut parts = parts_for("/?email=a@b.com", &[]);
        let rejection = ValidatedQuery::<Sample>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.code, 400);
        assert!(rejection.msg.is_some());
    }

    #[tokio::test]
    async fn test_validated_json_rejects_malformed_body() {
        let req = HttpRequest::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        let rejection = ValidatedJson::<Sample>::from_request(req, &()).await.unwrap_err();
        assert_eq!(rejection.code, 400);
    }

    fn with_peer(mut parts: Parts, peer: [u8; 4]) -> Parts {
        parts.extensions.insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        parts
    }

    #[tokio::test]
    async fn test_client_ip_ignores_headers_from_untrusted_peer() {
        let proxies = TrustedProxies::default();
        let mut parts = with_peer(
            parts_for("/", &[("x-forwarded-for", "6.6.6.1"), ("x-real-ip", "6.6.6.2")]),
            [1, 2, 3, 4],
        );

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &proxies).await.unwrap();
        assert_eq!(ip, "1.2.3.4");
    }

    #[tokio::test]
    async fn test_client_ip_behind_trusted_proxy() {
        let proxies = TrustedProxies::new(vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()]);

        // The client prepended a fake hop; the proxies appended the real one
        let mut parts = with_peer(
            parts_for("/", &[("x-forwarded-for", "6.6.6.6, 203.0.113.7, 10.0.0.2")]),
            [10, 0, 0, 1],
        );
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &proxies).await.unwrap();
        assert_eq!(ip, "203.0.113.7");

        let mut parts = with_peer(parts_for("/", &[("x-real-ip", "198.51.100.4")]), [10, 0, 0, 1]);
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &proxies).await.unwrap();
        assert_eq!(ip, "198.51.100.4");

        let mut parts = with_peer(parts_for("/", &[]), [10, 0, 0, 1]);
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &proxies).await.unwrap();
        assert_eq!(ip, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_client_ip_without_peer_address() {
        let proxies = TrustedProxies::default();
        let mut parts = parts_for("/", &[("x-forwarded-for", "10.0.0.1")]);

        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &proxies).await.unwrap();
        assert_eq!(ip, "unknown");
    }

    #[test]
    fn test_proxy_list_skips_invalid_entries() {
        assert_eq!(
            parse_proxy_list(" 10.0.0.1, nope ,::1,"),
            vec!["10.0.0.1".parse::<IpAddr>().unwrap(), "::1".parse::<IpAddr>().unwrap()]
        );
    }
}
