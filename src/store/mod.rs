//! Store adapter interface.
//!
//! The factory core persists and removes instances through `Store`, which only knows about
//! single-row inserts and primary-key deletes. Connection pooling, timeouts and transactions
//! are the adapter's concern. An implementation for SeaORM's `DatabaseConnection` is provided
//! in `sea`.

pub mod sea;

use async_trait::async_trait;

use crate::{error::StoreError, value::Value};

/// Single-row persistence used by `Fixtures`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts one row.
    ///
    /// # Arguments
    /// - `table` - Store table name
    /// - `primary_key` - Primary-key column name
    /// - `columns` - Column/value pairs; the primary-key column is absent when the store should
    ///   assign the key
    ///
    /// # Returns
    /// - `Ok(Value)` - Primary key of the inserted row, supplied or store-assigned
    /// - `Err(StoreError)` - Insert failed
    async fn insert_row(
        &self,
        table: &str,
        primary_key: &str,
        columns: &[(&str, Value)],
    ) -> Result<Value, StoreError>;

    /// Deletes the row with the given primary key.
    ///
    /// # Returns
    /// - `Ok(())` - Exactly the addressed row was removed
    /// - `Err(StoreError::NotFound)` - No row has that key
    /// - `Err(StoreError)` - Delete failed
    async fn delete_row(
        &self,
        table: &str,
        primary_key: &str,
        key: Value,
    ) -> Result<(), StoreError>;
}
