// Test doubles for the domain service traits
// This module is only available when the "mock" feature is enabled

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::entities::account::{
    AccountIdentity, CodeType, ConfirmResetForm, EmailRegisterForm, EmailResetForm,
};
use crate::entities::blood_pressure::{BloodPressureForm, BloodPressureRecord, UpdateBloodPressureForm};
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::account::{AccountServiceError, AccountServiceTrait};
use crate::services::blood_pressure::{BloodPressureServiceError, BloodPressureServiceTrait};
use crate::services::category::categorize_blood_pressure;

/// One call received by [`MockAccountService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCall {
    EmailCode { code_type: CodeType, email: String, ip: String },
    PhoneCode { code_type: CodeType, phone: String, ip: String },
    Register(EmailRegisterForm),
    ConfirmReset(ConfirmResetForm),
    ResetPassword(EmailResetForm),
    Authenticate { username: String },
}

/// Configurable account service double
///
/// Every operation succeeds unless a failure was configured with
/// [`MockAccountService::failing_with`]. Calls are recorded.
#[derive(Debug, Default)]
pub struct MockAccountService {
    failure: Option<fn() -> AccountServiceError>,
    identity: Option<AccountIdentity>,
    calls: Mutex<Vec<AccountCall>>,
}

impl MockAccountService {
    /// Create a double where every call succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with the error built by `failure`
    pub fn failing_with(mut self, failure: fn() -> AccountServiceError) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Identity returned by `authenticate`
    pub fn with_identity(mut self, identity: AccountIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<AccountCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: AccountCall) -> Result<(), AccountServiceError> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AccountServiceTrait for MockAccountService {
    async fn send_email_verification_code(
        &self,
        code_type: CodeType,
        email: &str,
        ip: &str,
    ) -> Result<(), AccountServiceError> {
        self.record(AccountCall::EmailCode {
            code_type,
            email: email.to_string(),
            ip: ip.to_string(),
        })
    }

    async fn send_phone_verification_code(
        &self,
        code_type: CodeType,
        phone: &str,
        ip: &str,
    ) -> Result<(), AccountServiceError> {
        self.record(AccountCall::PhoneCode {
            code_type,
            phone: phone.to_string(),
            ip: ip.to_string(),
        })
    }

    async fn register_email_account(&self, form: EmailRegisterForm) -> Result<(), AccountServiceError> {
        self.record(AccountCall::Register(form))
    }

    async fn email_confirm_reset(&self, form: ConfirmResetForm) -> Result<(), AccountServiceError> {
        self.record(AccountCall::ConfirmReset(form))
    }

    async fn reset_email_account_password(&self, form: EmailResetForm) -> Result<(), AccountServiceError> {
        self.record(AccountCall::ResetPassword(form))
    }

    async fn authenticate(&self, username: &str, _password: &str) -> Result<AccountIdentity, AccountServiceError> {
        self.record(AccountCall::Authenticate {
            username: username.to_string(),
        })?;
        Ok(self.identity.clone().unwrap_or_else(|| AccountIdentity {
            id: 1,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            role: "user".to_string(),
        }))
    }
}

/// In-memory blood pressure service double
#[derive(Debug, Default)]
pub struct MockBloodPressureService {
    records: Mutex<HashMap<i64, BloodPressureRecord>>,
    next_id: Mutex<i64>,
    should_fail_storage: bool,
}

impl MockBloodPressureService {
    /// Create an empty double
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every storage access fail
    pub fn with_storage_failure(mut self) -> Self {
        self.should_fail_storage = true;
        self
    }

    /// Seed a record
    pub fn with_record(self, record: BloodPressureRecord) -> Self {
        {
            let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            *next_id = (*next_id).max(record.id);
            self.records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(record.id, record);
        }
        self
    }
}

fn build_record(id: i64, account_id: i64, form: BloodPressureForm) -> BloodPressureRecord {
    BloodPressureRecord {
        id,
        account_id,
        category: categorize_blood_pressure(form.systolic, form.diastolic),
        systolic: form.systolic,
        diastolic: form.diastolic,
        pulse: form.pulse,
        date: form.date,
        time: form.time,
        notes: form.notes,
        create_time: Utc::now(),
    }
}

#[async_trait]
impl BloodPressureServiceTrait for MockBloodPressureService {
    async fn create_record(
        &self,
        account_id: i64,
        form: BloodPressureForm,
    ) -> Result<BloodPressureRecord, BloodPressureServiceError> {
        if form.systolic <= form.diastolic {
            return Err(BloodPressureServiceError::SystolicNotAboveDiastolic);
        }
        if self.should_fail_storage {
            return Err(BloodPressureServiceError::CreateFailed("mock storage failure".to_string()));
        }

        let id = {
            let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
            *next_id += 1;
            *next_id
        };
        let record = build_record(id, account_id, form);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, record.clone());
        Ok(record)
    }

    async fn delete_record(&self, account_id: i64, id: i64) -> Result<(), BloodPressureServiceError> {
        if self.should_fail_storage {
            return Err(BloodPressureServiceError::DeleteFailed("mock storage failure".to_string()));
        }

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        match records.get(&id) {
            Some(record) if record.account_id == account_id => {
                records.remove(&id);
                Ok(())
            }
            _ => Err(BloodPressureServiceError::NotFound),
        }
    }

    async fn update_record(
        &self,
        account_id: i64,
        update: UpdateBloodPressureForm,
    ) -> Result<(), BloodPressureServiceError> {
        if update.form.systolic <= update.form.diastolic {
            return Err(BloodPressureServiceError::SystolicNotAboveDiastolic);
        }
        if self.should_fail_storage {
            return Err(BloodPressureServiceError::UpdateFailed("mock storage failure".to_string()));
        }

        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        match records.get(&update.id) {
            Some(record) if record.account_id == account_id => {
                let replaced = build_record(update.id, account_id, update.form);
                records.insert(update.id, replaced);
                Ok(())
            }
            _ => Err(BloodPressureServiceError::NotFound),
        }
    }

    async fn get_records(
        &self,
        account_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BloodPressureRecord>, BloodPressureServiceError> {
        if self.should_fail_storage {
            return Err(BloodPressureServiceError::QueryFailed("mock storage failure".to_string()));
        }

        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<BloodPressureRecord> = records
            .values()
            .filter(|r| r.account_id == account_id && r.date == date)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.time.cmp(&b.time));
        Ok(list)
    }
}

/// Health service double with a configurable database status
#[derive(Debug, Default)]
pub struct MockHealthService {
    database_down: bool,
}

impl MockHealthService {
    /// Create a double reporting a healthy database
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the database as unreachable
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_down = true;
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let (status, component) = match self.check_database_status().await {
            Ok(()) => (
                SystemStatus::Healthy,
                HealthComponent {
                    status: ComponentStatus::Healthy,
                    details: None,
                },
            ),
            Err(e) => (
                SystemStatus::Unhealthy,
                HealthComponent {
                    status: ComponentStatus::Unhealthy,
                    details: Some(e),
                },
            ),
        };

        SystemHealth {
            status,
            components: HashMap::from([("database".to_string(), component)]),
        }
    }

    async fn check_database_status(&self) -> Result<(), String> {
        if self.database_down {
            Err("Database connection failed".to_string())
        } else {
            Ok(())
        }
    }
}
