use async_trait::async_trait;

use super::errors::RepositoryError;

/// Generic CRUD operations over one table, keyed by an integer id
#[async_trait]
pub trait BaseMapper<T>: Send + Sync {
    /// Insert a row. The `id` carried by `entity` is ignored and the stored
    /// entity is returned with the id assigned by the database.
    async fn insert(&self, entity: T) -> Result<T, RepositoryError>;

    /// Fetch a row by primary key
    async fn select_by_id(&self, id: i64) -> Result<Option<T>, RepositoryError>;

    /// Overwrite every column of the row with the entity's id.
    /// Returns `false` when no such row exists.
    async fn update_by_id(&self, entity: &T) -> Result<bool, RepositoryError>;

    /// Delete a row by primary key. Returns `false` when no such row exists.
    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError>;
}
