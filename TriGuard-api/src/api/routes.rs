use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::FromRef,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::debug;

use triguard_domain::auth::TokenManager;
use triguard_domain::health::HealthServiceTrait;
use triguard_domain::services::{AccountServiceTrait, BloodPressureServiceTrait};

use crate::api::extract::TrustedProxies;
use crate::api::handlers::{authorization, blood_pressure, health};
use crate::api::middleware::auth_middleware;
use crate::openapi::configure_swagger_routes;

/// Shared account service
pub type AccountServiceRef = Arc<dyn AccountServiceTrait>;

/// Shared blood pressure service
pub type BloodPressureServiceRef = Arc<dyn BloodPressureServiceTrait>;

/// Shared health service
pub type HealthServiceRef = Arc<dyn HealthServiceTrait>;

/// State shared by every handler. Handlers extract only the part they need.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub account_service: AccountServiceRef,
    pub blood_pressure_service: BloodPressureServiceRef,
    pub health_service: HealthServiceRef,
    pub token_manager: Arc<TokenManager>,
    pub trusted_proxies: TrustedProxies,
}

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    let require_login = || middleware::from_fn_with_state(state.token_manager.clone(), auth_middleware);

    // `route_layer` only wraps the routes registered before it
    let auth_routes = Router::new()
        .route("/logout", get(authorization::logout))
        .route_layer(require_login())
        .route("/email-code", get(authorization::ask_verify_code))
        .route("/phone-code", get(authorization::ask_phone_code))
        .route("/email-register", post(authorization::register))
        .route("/reset-confirm", post(authorization::reset_confirm))
        .route("/reset-password", post(authorization::reset_password))
        .route("/login", post(authorization::login));

    debug!("Auth routes configured");

    let blood_pressure_routes = Router::new()
        .route("/create", post(blood_pressure::create_record))
        .route("/delete", get(blood_pressure::delete_record))
        .route("/update", post(blood_pressure::update_record))
        .route("/get", get(blood_pressure::get_records))
        .route_layer(require_login());

    debug!("Blood pressure routes configured");

    let app = Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .nest("/api/blood-pressure", blood_pressure_routes)
        .with_state(state)
        .merge(configure_swagger_routes());

    debug!("Swagger UI merged");

    apply_http_layers(app)
}

/// CORS, security headers and request tracing for the whole application
fn apply_http_layers(app: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(3600));

    let security_headers = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("permissions-policy"),
            HeaderValue::from_static("camera=(), microphone=(), geolocation=(), interest-cohort=()"),
        ));

    app.layer(cors)
        .layer(security_headers)
        .layer(TraceLayer::new_for_http())
}
