// TriGuard API
//
// HTTP layer of the TriGuard backend: routes, handlers, request and
// response entities and the OpenAPI document.

pub mod api;
pub mod entities;
pub mod openapi;

pub use api::{create_app, AppState, TrustedProxies};
