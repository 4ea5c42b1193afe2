use axum::{extract::State, Extension};
use tracing::{error, info, instrument};

use triguard_domain::auth::AuthenticatedAccount;
use triguard_domain::services::BloodPressureServiceError;

use crate::api::extract::{ValidatedJson, ValidatedQuery};
use crate::api::routes::BloodPressureServiceRef;
use crate::entities::blood_pressure::{
    BloodPressureCreateVO, BloodPressureUpdateVO, BloodPressureVO, RecordDateQuery, RecordIdQuery,
};
use crate::entities::{message_handle, RestResponse};

/// Record a new blood pressure measurement
#[utoipa::path(
    post,
    path = "/api/blood-pressure/create",
    request_body = BloodPressureCreateVO,
    responses(
        (status = 200, description = "Record created, `data` is the stored record", body = RestResponse),
        (status = 400, description = "Invalid input or record refused", body = RestResponse),
        (status = 401, description = "Missing or invalid token", body = RestResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "blood_pressure"
)]
#[instrument(skip(service, account, vo), fields(account_id = account.id))]
pub async fn create_record(
    State(service): State<BloodPressureServiceRef>,
    Extension(account): Extension<AuthenticatedAccount>,
    ValidatedJson(vo): ValidatedJson<BloodPressureCreateVO>,
) -> RestResponse<BloodPressureVO> {
    match service.create_record(account.id, vo.into()).await {
        Ok(record) => {
            info!("Blood pressure record {} created", record.id);
            RestResponse::success(record.into())
        }
        Err(e) => RestResponse::failure(400, e.to_string()),
    }
}

/// Delete one of the caller's records
#[utoipa::path(
    get,
    path = "/api/blood-pressure/delete",
    params(RecordIdQuery),
    responses(
        (status = 200, description = "Record deleted", body = RestResponse),
        (status = 400, description = "Record missing or not owned by the caller", body = RestResponse),
        (status = 401, description = "Missing or invalid token", body = RestResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "blood_pressure"
)]
#[instrument(skip(service, account), fields(account_id = account.id))]
pub async fn delete_record(
    State(service): State<BloodPressureServiceRef>,
    Extension(account): Extension<AuthenticatedAccount>,
    ValidatedQuery(query): ValidatedQuery<RecordIdQuery>,
) -> RestResponse<()> {
    message_handle(service.delete_record(account.id, query.id).await)
}

/// Overwrite one of the caller's records
#[utoipa::path(
    post,
    path = "/api/blood-pressure/update",
    request_body = BloodPressureUpdateVO,
    responses(
        (status = 200, description = "Record updated", body = RestResponse),
        (status = 400, description = "Invalid input, record missing or not owned by the caller", body = RestResponse),
        (status = 401, description = "Missing or invalid token", body = RestResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "blood_pressure"
)]
#[instrument(skip(service, account, vo), fields(account_id = account.id, record_id = vo.id))]
pub async fn update_record(
    State(service): State<BloodPressureServiceRef>,
    Extension(account): Extension<AuthenticatedAccount>,
    ValidatedJson(vo): ValidatedJson<BloodPressureUpdateVO>,
) -> RestResponse<()> {
    message_handle(service.update_record(account.id, vo.into()).await)
}

/// The caller's records for one day, earliest first
#[utoipa::path(
    get,
    path = "/api/blood-pressure/get",
    params(RecordDateQuery),
    responses(
        (status = 200, description = "Records of the day", body = RestResponse),
        (status = 400, description = "Invalid date", body = RestResponse),
        (status = 401, description = "Missing or invalid token", body = RestResponse),
        (status = 500, description = "Storage failure", body = RestResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "blood_pressure"
)]
#[instrument(skip(service, account), fields(account_id = account.id))]
pub async fn get_records(
    State(service): State<BloodPressureServiceRef>,
    Extension(account): Extension<AuthenticatedAccount>,
    ValidatedQuery(query): ValidatedQuery<RecordDateQuery>,
) -> RestResponse<Vec<BloodPressureVO>> {
    match service.get_records(account.id, query.date).await {
        Ok(records) => RestResponse::success(records.into_iter().map(BloodPressureVO::from).collect()),
        Err(e @ BloodPressureServiceError::QueryFailed(_)) => {
            error!("Failed to list blood pressure records: {:?}", e);
            RestResponse::failure(500, e.to_string())
        }
        Err(e) => RestResponse::failure(400, e.to_string()),
    }
}
