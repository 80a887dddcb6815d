//! The database-facing seams bulk operations run against.
//!
//! The crate never talks to a driver directly: operations depend on these
//! traits only, and a test harness (or real driver glue) supplies them.

use crate::dataset::map::CaseSensitivity;
use crate::dataset::DefaultDataSet;
use crate::error::FixtureResult;

/// Feature flags of the live connection.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Name-matching policy for table lookups against the live schema.
    pub case_sensitivity: CaseSensitivity,
    /// Schema used to qualify table names (`schema.table`) when set.
    pub schema: Option<String>,
    /// Maximum statements submitted per batch. Statement sets larger than
    /// this are chunked.
    pub batch_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            case_sensitivity: CaseSensitivity::Insensitive,
            schema: None,
            batch_size: 100,
        }
    }
}

impl DatabaseConfig {
    /// Render a table reference, qualified with the schema when configured.
    pub fn table_ref(&self, table: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{table}"),
            None => table.to_owned(),
        }
    }
}

/// Executes SQL statements against the live database.
pub trait StatementExecutor {
    /// Execute one statement, returning the number of affected rows.
    fn execute(&mut self, sql: &str) -> FixtureResult<usize>;

    /// Execute a batch, returning total affected rows.
    ///
    /// Default behavior executes sequentially; drivers with real batch
    /// support override this.
    fn execute_batch(&mut self, statements: &[String]) -> FixtureResult<usize> {
        let mut affected = 0;
        for sql in statements {
            affected += self.execute(sql)?;
        }
        Ok(affected)
    }
}

/// A live database connection, scoped to one setup/verify/teardown cycle.
pub trait DatabaseConnection {
    /// The connection's feature flags.
    fn config(&self) -> &DatabaseConfig;

    /// Scan the live schema into a dataset (table per table, current rows).
    fn create_dataset(&mut self) -> FixtureResult<DefaultDataSet>;

    /// The statement executor backing this connection.
    fn executor(&mut self) -> &mut dyn StatementExecutor;

    /// Release the connection and its derived resources.
    ///
    /// Must be called on every exit path of a cycle; see
    /// [`crate::operation::run_cycle`].
    fn close(&mut self) -> FixtureResult<()>;
}
