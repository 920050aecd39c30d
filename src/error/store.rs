use thiserror::Error;

use crate::{error::BoxError, value::Value};

/// Failure reported by, or on the way to, the store adapter.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error from SeaORM, including driver timeouts.
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    /// Delete affected no row for the given primary key.
    #[error("no row in `{table}` with primary key {key}")]
    NotFound { table: String, key: Value },

    /// Delete was requested for an instance whose primary key is unset.
    #[error("cannot delete from `{table}`: primary key `{field}` is unset")]
    MissingKey { table: String, field: String },

    /// Row could not be turned into a statement, or the store returned no key.
    #[error("invalid row for `{table}`: {message}")]
    InvalidRow { table: String, message: String },

    /// Error from a custom store adapter.
    #[error(transparent)]
    Adapter(BoxError),
}
