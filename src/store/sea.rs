//! `Store` implementation for SeaORM connections.
//!
//! Statements are built with `sea_query` against plain identifiers, so any table reachable
//! through the connection can be used without declaring SeaORM entities for it.

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Alias, Expr, ExprTrait, Query, SimpleExpr},
    ConnectionTrait, DatabaseConnection,
};

use crate::{error::StoreError, store::Store, value::Value};

#[async_trait]
impl Store for DatabaseConnection {
    /// Inserts one row and reports its primary key.
    ///
    /// When the primary-key column is part of `columns` its value is returned as is. Otherwise
    /// the key assigned by the database is read back with `RETURNING` where the backend supports
    /// it, and from the driver's last insert id elsewhere.
    async fn insert_row(
        &self,
        table: &str,
        primary_key: &str,
        columns: &[(&str, Value)],
    ) -> Result<Value, StoreError> {
        let invalid = |message: String| StoreError::InvalidRow {
            table: table.to_string(),
            message,
        };

        let supplied_key = columns
            .iter()
            .find(|(column, _)| *column == primary_key)
            .map(|(_, value)| value.clone());

        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(table));
        if columns.is_empty() {
            stmt.or_default_values();
        } else {
            let values: Vec<SimpleExpr> = columns
                .iter()
                .map(|(_, value)| sea_orm::Value::from(value.clone()).into())
                .collect();
            stmt.columns(columns.iter().map(|(column, _)| Alias::new(*column)))
                .values(values)
                .map_err(|e| invalid(e.to_string()))?;
        }

        if let Some(key) = supplied_key {
            let statement = self.get_database_backend().build(&stmt);
            tracing::trace!(sql = %statement.sql, "insert");
            self.execute(&stmt).await?;
            return Ok(key);
        }

        if self.support_returning() {
            stmt.returning_col(Alias::new(primary_key));
            let statement = self.get_database_backend().build(&stmt);
            tracing::trace!(sql = %statement.sql, "insert returning key");

            let row = self
                .query_one(&stmt)
                .await?
                .ok_or_else(|| invalid("insert returned no row".to_string()))?;
            let key: i64 = row.try_get_by_index(0)?;
            Ok(Value::Int(key))
        } else {
            let statement = self.get_database_backend().build(&stmt);
            tracing::trace!(sql = %statement.sql, "insert");

            let result = self.execute(&stmt).await?;
            let key = i64::try_from(result.last_insert_id())
                .map_err(|_| invalid("last insert id does not fit i64".to_string()))?;
            Ok(Value::Int(key))
        }
    }

    async fn delete_row(
        &self,
        table: &str,
        primary_key: &str,
        key: Value,
    ) -> Result<(), StoreError> {
        let mut stmt = Query::delete();
        stmt.from_table(Alias::new(table))
            .and_where(Expr::col(Alias::new(primary_key)).eq(sea_orm::Value::from(key.clone())));

        let statement = self.get_database_backend().build(&stmt);
        tracing::trace!(sql = %statement.sql, "delete");

        let result = self.execute(&stmt).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                table: table.to_string(),
                key,
            });
        }

        Ok(())
    }
}
