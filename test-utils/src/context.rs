use sea_orm::{
    sea_query::TableCreateStatement, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection,
};

use crate::error::TestError;

/// Test context containing the database connection of one test.
///
/// Provides an in-memory SQLite database connection for isolated testing. The database is
/// created lazily on first access and persists for the lifetime of the test context.
pub struct TestContext {
    /// Optional database connection to in-memory SQLite instance.
    ///
    /// Initialized lazily when `database()` is first called. Using `Option` allows
    /// deferred connection until actually needed by the test.
    pub db: Option<DatabaseConnection>,
}

impl TestContext {
    /// Creates a new empty test context.
    ///
    /// # Returns
    /// - New `TestContext` instance with no database connection
    pub fn new() -> Self {
        Self { db: None }
    }

    /// Gets or creates the in-memory SQLite database connection.
    ///
    /// Returns a reference to the existing database connection if one exists, otherwise
    /// creates a new in-memory SQLite database and stores the connection. The pool holds a
    /// single connection, so concurrent queries from one test share the same database.
    ///
    /// # Returns
    /// - `Ok(&DatabaseConnection)` - Reference to the database connection
    /// - `Err(TestError::Database)` - Failed to connect to in-memory SQLite database
    pub async fn database(&mut self) -> Result<&DatabaseConnection, TestError> {
        match self.db {
            Some(ref db) => Ok(db),
            None => {
                // Every pooled connection to `sqlite::memory:` opens its own empty database.
                let mut options = ConnectOptions::new("sqlite::memory:");
                options.max_connections(1).min_connections(1);
                let db = Database::connect(options).await?;

                let db_ref = self.db.insert(db);

                Ok(&*db_ref)
            }
        }
    }

    /// Creates database tables from the provided CREATE TABLE statements.
    ///
    /// Typically called by `TestBuilder::build()` rather than directly.
    ///
    /// # Arguments
    /// - `stmts` - Vector of CREATE TABLE statements to execute
    ///
    /// # Returns
    /// - `Ok(())` - All tables created successfully
    /// - `Err(TestError::Database)` - Failed to create one or more tables
    pub async fn with_tables(&mut self, stmts: Vec<TableCreateStatement>) -> Result<(), TestError> {
        let db = self.database().await?;

        for stmt in stmts {
            db.execute(&stmt).await?;
        }

        Ok(())
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use entity::prelude::TestUser;
    use sea_orm::{DbErr, EntityTrait};

    use crate::builder::TestBuilder;

    /// Tests that the builder creates the requested tables.
    ///
    /// Verifies that a freshly built context can query an empty test table.
    ///
    /// Expected: Ok with no rows
    #[tokio::test]
    async fn creates_requested_tables() -> Result<(), DbErr> {
        let test = TestBuilder::new().with_table(TestUser).build().await.unwrap();
        let db = test.db.as_ref().unwrap();

        let users = TestUser::find().all(db).await?;
        assert!(users.is_empty());

        Ok(())
    }
}
