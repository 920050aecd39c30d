//! Fixture Factory
//!
//! Declarative test-fixture factories. A test describes what varies per test (a name, an id
//! sequence, an association) and the factory fills in the ordinary values, resolves related
//! records, persists the instance through a store adapter and deletes it again on request.
//!
//! # Overview
//!
//! - **Model / Schema**: the model shape and its explicit field-name to accessor mapping
//! - **Factory**: immutable definition of field rules, traits, associations and hooks
//! - **Fixtures**: handle that builds, creates and deletes instances against a `Store`
//! - **SequenceRegistry**: per-factory, per-field counters shared by every call of a handle
//!
//! # Usage
//!
//! ```rust,ignore
//! use fixture_factory::prelude::*;
//!
//! let users = Factory::<User>::builder("test_user")
//!     .field("name", "test name")
//!     .sequence("id", 1, |n| Ok(n.into()))
//!     .build()?;
//!
//! let fixtures = Fixtures::new(db.clone());
//! let user = fixtures.create(&users).with_field("country", "NZ").await?;
//! fixtures.delete(&users, &user).await?;
//! ```

pub mod config;
pub mod definition;
pub mod error;
pub mod fixtures;
pub mod model;
pub mod options;
pub mod sequence;
pub mod store;
pub mod value;

mod build;

#[cfg(test)]
mod test;

pub use config::Config;
pub use definition::{Association, DeclareRules, Factory, FieldRule, Hook, HookStage};
pub use error::{BoxError, CreateSliceError, FactoryError};
pub use fixtures::Fixtures;
pub use model::{Model, Schema};
pub use options::CallOptions;
pub use sequence::SequenceRegistry;
pub use store::Store;
pub use value::Value;

/// Everything needed to declare factories and create fixtures.
pub mod prelude {
    pub use crate::{
        Association, BoxError, CallOptions, Config, DeclareRules, Factory, FactoryError,
        Fixtures, Model, Schema, Value,
    };
}
