//! Fixture Factory Test Utils
//!
//! Provides the shared harness for the fixture factory test suite. This crate offers a builder
//! pattern for creating test contexts with in-memory SQLite databases holding the test tables
//! the factories persist into.
//!
//! # Overview
//!
//! The test utilities consist of three main components:
//! - **TestBuilder**: Fluent builder for configuring test environments
//! - **TestContext**: Test environment containing the database connection
//! - **TestError**: Error types that can occur during test setup
//!
//! # Usage
//!
//! Use `TestBuilder` to create a test context with the required database tables:
//!
//! ```rust,ignore
//! use test_utils::builder::TestBuilder;
//! use entity::prelude::TestUser;
//!
//! #[tokio::test]
//! async fn test_user_fixture() -> Result<(), TestError> {
//!     let test = TestBuilder::new()
//!         .with_table(TestUser)
//!         .build()
//!         .await?;
//!
//!     let db = test.db.unwrap();
//!     // Create fixtures against the connection...
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod context;
pub mod error;
