//! Behaviour tests against an in-memory SQLite database.


mod create;
mod slice;

use test_utils::{builder::TestBuilder, context::TestContext};

use crate::{error::BoxError, fixtures::Fixtures};

/// Creates every test table and a fixtures handle with a fresh sequence registry.
///
/// # Returns
/// - `Ok((TestContext, Fixtures))` - Context owning the database, and a handle on it
/// - `Err(BoxError)` - Database setup failed
pub async fn setup() -> Result<(TestContext, Fixtures), BoxError> {
    let test = TestBuilder::new().with_blog_tables().build().await?;
    let db = test.db.clone().ok_or("test database not initialized")?;
    Ok((test, Fixtures::new(db)))
}
