use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform response envelope returned by every endpoint
///
/// Serialized as `{code, msg, data}` with nulls kept. The HTTP status of
/// the response equals `code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestResponse<T> {
    /// Status code, mirrored as the HTTP status
    pub code: u16,

    /// Failure message, absent on success
    pub msg: Option<String>,

    /// Payload, absent on failure
    pub data: Option<T>,
}

impl<T> RestResponse<T> {
    /// Success carrying a payload
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            msg: None,
            data: Some(data),
        }
    }

    /// Success without payload
    pub fn success_empty() -> Self {
        Self {
            code: 200,
            msg: None,
            data: None,
        }
    }

    /// Failure with a status code and message
    pub fn failure(code: u16, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: Some(msg.into()),
            data: None,
        }
    }
}

/// Turn a service outcome into an envelope: `Ok` is a bare success, `Err`
/// a 400 carrying the error's display text verbatim
pub fn message_handle<E: Display>(result: Result<(), E>) -> RestResponse<()> {
    match result {
        Ok(()) => RestResponse::success_empty(),
        Err(e) => RestResponse::failure(400, e.to_string()),
    }
}

impl<T: Serialize> IntoResponse for RestResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Envelope shape as documented in the OpenAPI schema
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = RestResponse)]
pub struct RestResponseSchema {
    /// Status code, mirrored as the HTTP status
    #[schema(example = 200)]
    pub code: u16,

    /// Failure message, null on success
    pub msg: Option<String>,

    /// Payload, null on failure or when the operation returns nothing
    #[schema(value_type = Option<Object>)]
    pub data: Option<serde_json::Value>,
}
