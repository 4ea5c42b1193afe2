use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use super::base::BaseMapper;
use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::account::Account;

/// Mapper for the `accounts` table
#[async_trait]
pub trait AccountMapper: BaseMapper<Account> {
    /// Find an account whose username or e-mail equals `text`
    async fn find_by_username_or_email(&self, text: &str) -> Result<Option<Account>, RepositoryError>;

    /// Whether an account with this e-mail exists
    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;

    /// Whether an account with this phone number exists
    async fn exists_by_phone(&self, phone: &str) -> Result<bool, RepositoryError>;

    /// Whether an account with this username exists
    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError>;

    /// Replace the password hash of the account owning `email`.
    /// Returns `false` when no account matched.
    async fn update_password_by_email(&self, email: &str, password: &str) -> Result<bool, RepositoryError>;
}

const ACCOUNT_COLUMNS: &str = "id, username, password, email, phone, role, register_time";

/// SQLite implementation of [`AccountMapper`]
#[derive(Debug, Clone)]
pub struct SqliteAccountMapper {
    pool: DatabasePool,
}

impl SqliteAccountMapper {
    /// Create a mapper over the given pool
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn exists_where(&self, column: &str, value: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT EXISTS(SELECT 1 FROM accounts WHERE {} = ?1)", column);
        let exists: bool = conn.query_row(&sql, [value], |row| row.get(0))?;
        Ok(exists)
    }
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        role: row.get(5)?,
        register_time: row.get(6)?,
    })
}

#[async_trait]
impl BaseMapper<Account> for SqliteAccountMapper {
    async fn insert(&self, entity: Account) -> Result<Account, RepositoryError> {
        debug!("Inserting account: username={}", entity.username);
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO accounts (username, password, email, phone, role, register_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &entity.username,
                &entity.password,
                &entity.email,
                &entity.phone,
                &entity.role,
                &entity.register_time,
            ],
        )
        .map_err(RepositoryError::from_write)?;

        Ok(Account {
            id: conn.last_insert_rowid(),
            ..entity
        })
    }

    async fn select_by_id(&self, id: i64) -> Result<Option<Account>, RepositoryError> {
        debug!("Selecting account by id: {}", id);
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS);
        let account = conn.query_row(&sql, [id], map_account).optional()?;
        Ok(account)
    }

    async fn update_by_id(&self, entity: &Account) -> Result<bool, RepositoryError> {
        debug!("Updating account: id={}", entity.id);
        let conn = self.pool.get()?;

        let changed = conn
            .execute(
                "UPDATE accounts SET username = ?1, password = ?2, email = ?3, phone = ?4,
                 role = ?5, register_time = ?6 WHERE id = ?7",
                params![
                    &entity.username,
                    &entity.password,
                    &entity.email,
                    &entity.phone,
                    &entity.role,
                    &entity.register_time,
                    entity.id,
                ],
            )
            .map_err(RepositoryError::from_write)?;

        Ok(changed > 0)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        debug!("Deleting account: id={}", id);
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM accounts WHERE id = ?1", [id])?;
        Ok(changed > 0)
    }
}

#[async_trait]
impl AccountMapper for SqliteAccountMapper {
    async fn find_by_username_or_email(&self, text: &str) -> Result<Option<Account>, RepositoryError> {
        debug!("Finding account by username or email");
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM accounts WHERE username = ?1 OR email = ?1",
            ACCOUNT_COLUMNS
        );
        let account = conn.query_row(&sql, [text], map_account).optional()?;
        Ok(account)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        self.exists_where("email", email)
    }

    async fn exists_by_phone(&self, phone: &str) -> Result<bool, RepositoryError> {
        self.exists_where("phone", phone)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, RepositoryError> {
        self.exists_where("username", username)
    }

    async fn update_password_by_email(&self, email: &str, password: &str) -> Result<bool, RepositoryError> {
        debug!("Updating password by email");
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE accounts SET password = ?1 WHERE email = ?2",
            [password, email],
        )?;
        Ok(changed > 0)
    }
}
