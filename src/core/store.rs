//! Record store trait used by the auth extension and the CRUD controllers

use super::error::StorageError;
use super::model::{Model, RowFilter};
use async_trait::async_trait;

/// Persistence for one model type
///
/// Every call is scoped on its own: no transaction is held open across
/// calls, and concurrent writers are last-write-wins.
#[async_trait]
pub trait RecordStore<M: Model>: Send + Sync {
    /// Fetch one record by primary key
    async fn get(&self, id: i64) -> Result<Option<M>, StorageError>;

    /// Fetch a window of records ordered by primary key ascending
    ///
    /// # Parameters
    /// - `filter`: optional row predicate applied before the window
    /// - `offset`: number of matching rows to skip
    /// - `limit`: maximum number of rows returned
    async fn find(
        &self,
        filter: Option<RowFilter<M>>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<M>, StorageError>;

    /// First record (lowest primary key) matching the predicate
    async fn find_one(&self, filter: RowFilter<M>) -> Result<Option<M>, StorageError> {
        Ok(self.find(Some(filter), 0, 1).await?.into_iter().next())
    }

    /// Total number of records
    async fn count(&self) -> Result<usize, StorageError>;

    /// Insert (no primary key) or replace (primary key set) a record
    ///
    /// Returns the stored record with its primary key assigned. Fails with
    /// [`StorageError::UniqueViolation`] when a unique column clashes.
    async fn upsert(&self, record: M) -> Result<M, StorageError>;

    /// Delete by primary key; `false` when nothing was removed
    async fn delete(&self, id: i64) -> Result<bool, StorageError>;

    /// Delete every record matching the predicate, returning how many were removed
    async fn delete_where(&self, filter: RowFilter<M>) -> Result<usize, StorageError>;
}
