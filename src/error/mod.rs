//! Error types for factory definition, resolution and persistence.
//!
//! `FactoryError` is the error returned by every `Fixtures` operation. It wraps the
//! definition-time, store and configuration errors from the submodules and adds the per-call
//! failures raised while resolving an instance: unknown override fields, values that do not fit
//! a field, failing generator functions and failing lifecycle hooks.
//!
//! No variant is retried internally and nothing already persisted is rolled back; the caller
//! owns cleanup through explicit deletes.

pub mod config;
pub mod definition;
pub mod store;

use std::fmt;

use thiserror::Error;

pub use self::{config::ConfigError, definition::DefinitionError, store::StoreError};
use crate::{definition::HookStage, value::Value};

/// Boxed error returned by user-supplied generators and hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error for build, create and delete calls.
#[derive(Error, Debug)]
pub enum FactoryError {
    /// Malformed factory declaration or an unknown trait selected at call time.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// A call-site override or relation override names a field the model does not have.
    ///
    /// # Fields
    /// - `table` - Store table of the factory being resolved
    /// - `field` - The unknown field name
    #[error("unknown field `{field}` on factory for `{table}`")]
    UnknownField { table: String, field: String },

    /// A value could not be written into a model field.
    #[error("invalid value for field `{field}`: {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: ValueError,
    },

    /// A sequence or dynamic field generator returned an error.
    #[error("generator for field `{field}` failed: {source}")]
    Generator {
        field: String,
        #[source]
        source: BoxError,
    },

    /// A lifecycle hook returned an error; remaining hooks of the call were skipped.
    #[error("{stage} hook failed: {source}")]
    Hook {
        stage: HookStage,
        #[source]
        source: BoxError,
    },

    /// Insert or delete failed in the store adapter.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Process configuration could not be loaded or installed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `create_slice(..).to(..)` was handed a destination that already holds elements.
    #[error("create_slice destination must be empty, found {len} element(s)")]
    NonEmptyDestination { len: usize },
}

/// Error converting a `Value` into a typed model field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The value kind does not match the field type.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An integer value does not fit the narrower field type.
    #[error("{value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: i64 },
}

impl ValueError {
    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        ValueError::Mismatch {
            expected,
            found: found.kind(),
        }
    }
}

/// Error returned when awaiting a `CreateSlice`.
///
/// Carries the instances that were created and persisted before the failing element so the
/// caller can clean them up.
pub struct CreateSliceError<M> {
    /// Instances persisted before the failure, in creation order.
    pub created: Vec<M>,
    /// The error raised by the failing element.
    pub source: FactoryError,
}

impl<M> fmt::Debug for CreateSliceError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSliceError")
            .field("created", &self.created.len())
            .field("source", &self.source)
            .finish()
    }
}

impl<M> fmt::Display for CreateSliceError<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "create_slice failed after {} instance(s): {}",
            self.created.len(),
            self.source
        )
    }
}

impl<M> std::error::Error for CreateSliceError<M> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Drops the partially created instances, keeping only the cause.
impl<M> From<CreateSliceError<M>> for FactoryError {
    fn from(err: CreateSliceError<M>) -> Self {
        err.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_unknown_field() {
        let err = FactoryError::UnknownField {
            table: "test_user".to_string(),
            field: "nope".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unknown field `nope` on factory for `test_user`"
        );
    }

    #[test]
    fn formats_hook_failure_with_stage() {
        let err = FactoryError::Hook {
            stage: HookStage::BeforeCreate,
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "before-create hook failed: boom");
    }

    #[test]
    fn slice_error_converts_to_cause() {
        let err = CreateSliceError {
            created: vec![1, 2],
            source: FactoryError::NonEmptyDestination { len: 1 },
        };
        assert_eq!(
            err.to_string(),
            concat!(
                "create_slice failed after 2 instance(s): ",
                "create_slice destination must be empty, found 1 element(s)"
            )
        );
        let cause: FactoryError = err.into();
        assert!(matches!(cause, FactoryError::NonEmptyDestination { len: 1 }));
    }
}
