use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use triguard_domain::health::{ComponentStatus, SystemStatus};

use crate::api::routes::HealthServiceRef;
use crate::entities::RestResponse;

/// Payload of `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `error`
    #[schema(example = "ok")]
    pub status: String,
    /// Application version from the Cargo manifest
    pub version: String,
    /// `ok`, or the reason the database probe failed
    #[schema(example = "ok")]
    pub database: String,
}

/// Health check endpoint to verify the API and its database are up
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is healthy", body = RestResponse),
        (status = 503, description = "Database unreachable", body = RestResponse)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(State(health_service): State<HealthServiceRef>) -> RestResponse<HealthResponse> {
    info!("Health check requested");

    let system_health = health_service.get_system_health().await;

    let database = match system_health.components.get("database") {
        Some(component) if component.status == ComponentStatus::Unhealthy => component
            .details
            .clone()
            .unwrap_or_else(|| "error".to_string()),
        _ => "ok".to_string(),
    };

    let (code, status) = match system_health.status {
        SystemStatus::Healthy => (200, "ok"),
        SystemStatus::Unhealthy => {
            warn!("Health check failed: database {}", database);
            (503, "error")
        }
    };

    RestResponse {
        code,
        msg: None,
        data: Some(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
        }),
    }
}
