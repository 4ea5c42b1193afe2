use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{error, info, warn};

use triguard_data::database::DatabasePool;
use triguard_data::repository::{BloodPressureMapper, RepositoryError, SqliteBloodPressureMapper};

use crate::entities::blood_pressure::{BloodPressureForm, BloodPressureRecord, UpdateBloodPressureForm};
use crate::entities::conversions;
use crate::services::category::is_hypertensive_crisis;

/// Blood pressure service errors. The display text is shown to the caller as is.
#[derive(Debug, Error)]
pub enum BloodPressureServiceError {
    #[error("收缩压必须大于舒张压")]
    SystolicNotAboveDiastolic,

    #[error("血压记录不存在")]
    NotFound,

    #[error("添加血压记录失败")]
    CreateFailed(String),

    #[error("删除血压记录失败")]
    DeleteFailed(String),

    #[error("修改血压记录失败")]
    UpdateFailed(String),

    #[error("内部错误，请联系管理员")]
    QueryFailed(String),
}

/// Trait for blood pressure operations. Every call is scoped to the
/// calling account.
#[async_trait]
pub trait BloodPressureServiceTrait: Send + Sync {
    /// Store a new record for the account
    async fn create_record(
        &self,
        account_id: i64,
        form: BloodPressureForm,
    ) -> Result<BloodPressureRecord, BloodPressureServiceError>;

    /// Delete one of the account's records
    async fn delete_record(&self, account_id: i64, id: i64) -> Result<(), BloodPressureServiceError>;

    /// Overwrite the measurement fields of one of the account's records
    async fn update_record(
        &self,
        account_id: i64,
        form: UpdateBloodPressureForm,
    ) -> Result<(), BloodPressureServiceError>;

    /// The account's records for one day, earliest first
    async fn get_records(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BloodPressureRecord>, BloodPressureServiceError>;
}

/// Blood pressure service for domain logic
pub struct BloodPressureService<M: BloodPressureMapper> {
    mapper: M,
}

impl<M: BloodPressureMapper> BloodPressureService<M> {
    /// Create a new blood pressure service
    pub fn new(mapper: M) -> Self {
        Self { mapper }
    }

    fn check_form(form: &BloodPressureForm) -> Result<(), BloodPressureServiceError> {
        if form.systolic <= form.diastolic {
            return Err(BloodPressureServiceError::SystolicNotAboveDiastolic);
        }
        Ok(())
    }
}

#[async_trait]
impl<M: BloodPressureMapper> BloodPressureServiceTrait for BloodPressureService<M> {
    async fn create_record(
        &self,
        account_id: i64,
        form: BloodPressureForm,
    ) -> Result<BloodPressureRecord, BloodPressureServiceError> {
        Self::check_form(&form)?;

        if is_hypertensive_crisis(form.systolic, form.diastolic) {
            warn!(
                "Account {} recorded a hypertensive crisis reading: {}/{}",
                account_id, form.systolic, form.diastolic
            );
        }

        let record = conversions::convert_to_data_record(account_id, form, Utc::now());
        let stored = self.mapper.insert(record).await.map_err(|e| {
            error!("Failed to insert blood pressure record: {}", e);
            BloodPressureServiceError::CreateFailed(e.to_string())
        })?;

        info!("Created blood pressure record {} for account {}", stored.id, account_id);
        Ok(conversions::convert_to_domain_record(stored))
    }

    async fn delete_record(&self, account_id: i64, id: i64) -> Result<(), BloodPressureServiceError> {
        let map_err = |e: RepositoryError| {
            error!("Failed to delete blood pressure record {}: {}", id, e);
            BloodPressureServiceError::DeleteFailed(e.to_string())
        };

        match self.mapper.select_by_id(id).await.map_err(map_err)? {
            Some(existing) if existing.account_id == account_id => {}
            _ => return Err(BloodPressureServiceError::NotFound),
        }

        if !self.mapper.delete_by_id(id).await.map_err(map_err)? {
            return Err(BloodPressureServiceError::NotFound);
        }

        info!("Deleted blood pressure record {} for account {}", id, account_id);
        Ok(())
    }

    async fn update_record(
        &self,
        account_id: i64,
        update: UpdateBloodPressureForm,
    ) -> Result<(), BloodPressureServiceError> {
        Self::check_form(&update.form)?;

        let map_err = |e: RepositoryError| {
            error!("Failed to update blood pressure record {}: {}", update.id, e);
            BloodPressureServiceError::UpdateFailed(e.to_string())
        };

        let existing = match self.mapper.select_by_id(update.id).await.map_err(map_err)? {
            Some(existing) if existing.account_id == account_id => existing,
            _ => return Err(BloodPressureServiceError::NotFound),
        };

        let record = conversions::apply_form_to_data_record(existing, update.form.clone());
        if !self.mapper.update_by_id(&record).await.map_err(map_err)? {
            return Err(BloodPressureServiceError::NotFound);
        }

        info!("Updated blood pressure record {} for account {}", update.id, account_id);
        Ok(())
    }

    async fn get_records(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BloodPressureRecord>, BloodPressureServiceError> {
        let records = self
            .mapper
            .select_by_account_and_date(account_id, date)
            .await
            .map_err(|e| {
                error!("Failed to list blood pressure records: {}", e);
                BloodPressureServiceError::QueryFailed(e.to_string())
            })?;

        Ok(records.into_iter().map(conversions::convert_to_domain_record).collect())
    }
}

/// Create the blood pressure service over the SQLite mapper
pub fn create_default_blood_pressure_service(
    pool: DatabasePool,
) -> impl BloodPressureServiceTrait + Send + Sync {
    BloodPressureService::new(SqliteBloodPressureMapper::new(pool))
}
