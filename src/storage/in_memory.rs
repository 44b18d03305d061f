//! In-memory implementation of RecordStore for testing and development

use crate::core::error::StorageError;
use crate::core::field::FieldValue;
use crate::core::model::{Model, RowFilter};
use crate::core::store::RecordStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

struct Table<M> {
    rows: BTreeMap<i64, M>,
    next_id: i64,
}

/// In-memory record store
///
/// Rows live in a `BTreeMap` keyed by primary key, so iteration order is
/// ascending id. Uses RwLock for thread-safe access; clones share the table.
pub struct InMemoryStore<M> {
    table: Arc<RwLock<Table<M>>>,
}

impl<M> Clone for InMemoryStore<M> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<M: Model> InMemoryStore<M> {
    /// Create an empty store; the first assigned id is 1
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            })),
        }
    }

    fn check_unique(table: &Table<M>, record: &M) -> Result<(), StorageError> {
        for field in M::unique_fields() {
            let value = match record.get_field(field) {
                Some(FieldValue::Null) | None => continue,
                Some(value) => value,
            };
            let clash = table
                .rows
                .values()
                .any(|row| row.id() != record.id() && row.get_field(field).as_ref() == Some(&value));
            if clash {
                return Err(StorageError::UniqueViolation {
                    model: M::NAME,
                    field,
                    value: value.display(),
                });
            }
        }
        Ok(())
    }
}

impl<M: Model> Default for InMemoryStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned(e: impl std::fmt::Display) -> StorageError {
    StorageError::LockPoisoned(e.to_string())
}

#[async_trait]
impl<M: Model> RecordStore<M> for InMemoryStore<M> {
    async fn get(&self, id: i64) -> Result<Option<M>, StorageError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find(
        &self,
        filter: Option<RowFilter<M>>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<M>, StorageError> {
        let table = self.table.read().map_err(poisoned)?;

        let rows = table
            .rows
            .values()
            .filter(|row| filter.as_ref().is_none_or(|f| f(row)))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok(rows)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.len())
    }

    async fn upsert(&self, mut record: M) -> Result<M, StorageError> {
        let mut table = self.table.write().map_err(poisoned)?;

        Self::check_unique(&table, &record)?;

        let id = match record.id() {
            Some(id) => id,
            None => {
                let id = table.next_id;
                record.set_id(Some(id));
                id
            }
        };
        table.next_id = table.next_id.max(id + 1);
        table.rows.insert(id, record.clone());

        Ok(record)
    }

    async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let mut table = self.table.write().map_err(poisoned)?;
        Ok(table.rows.remove(&id).is_some())
    }

    async fn delete_where(&self, filter: RowFilter<M>) -> Result<usize, StorageError> {
        let mut table = self.table.write().map_err(poisoned)?;
        let before = table.rows.len();
        table.rows.retain(|_, row| !filter(row));
        Ok(before - table.rows.len())
    }
}
