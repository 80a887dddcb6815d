//! Bulk database mutation strategies applied from a source dataset.
//!
//! Every strategy depends only on the [`crate::dataset`] contracts and the
//! seams in [`connection`]; SQL text is assembled from table metadata alone,
//! with no dialect knowledge beyond what [`DatabaseConfig`] supplies.
//!
//! Ordering rules: inserts process tables in dataset (declaration) order.
//! Deletes ([`Operation::Delete`], [`Operation::DeleteAll`],
//! [`Operation::Truncate`], and the delete phase of
//! [`Operation::CleanInsert`]) process tables in reverse order, so dependent
//! tables empty before the tables they reference.

pub mod connection;

pub use connection::{DatabaseConfig, DatabaseConnection, StatementExecutor};

use crate::dataset::column::Value;
use crate::dataset::{DataSet, Table};
use crate::error::{FixtureError, FixtureResult};

/// The bulk mutation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Do nothing.
    None,
    /// Insert every dataset row.
    Insert,
    /// Update every dataset row by primary key.
    Update,
    /// Delete the dataset's rows by primary key, tables reversed.
    Delete,
    /// Delete all rows of every dataset table, tables reversed.
    DeleteAll,
    /// Truncate every dataset table, tables reversed.
    Truncate,
    /// Update-or-insert every dataset row (update first, insert on zero
    /// affected rows).
    Refresh,
    /// [`Operation::DeleteAll`] followed by [`Operation::Insert`]: the
    /// canonical "bring the database to a known state" strategy.
    CleanInsert,
}

impl Operation {
    /// Apply this strategy from `dataset` through `conn`.
    pub fn execute(
        &self,
        dataset: &dyn DataSet,
        conn: &mut dyn DatabaseConnection,
    ) -> FixtureResult<()> {
        match self {
            Operation::None => Ok(()),
            Operation::Insert => insert(dataset, conn),
            Operation::Update => update(dataset, conn),
            Operation::Delete => delete(dataset, conn),
            Operation::DeleteAll => delete_all(dataset, conn, "DELETE FROM"),
            Operation::Truncate => delete_all(dataset, conn, "TRUNCATE TABLE"),
            Operation::Refresh => refresh(dataset, conn),
            Operation::CleanInsert => {
                delete_all(dataset, conn, "DELETE FROM")?;
                insert(dataset, conn)
            }
        }
    }
}

/// Render a value as a SQL literal.
fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_owned(),
        Value::Boolean(true) => "TRUE".to_owned(),
        Value::Boolean(false) => "FALSE".to_owned(),
        Value::Integer(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Text(_) | Value::Date(_) | Value::Timestamp(_) => {
            format!("'{}'", value.to_string().replace('\'', "''"))
        }
    }
}

fn submit(conn: &mut dyn DatabaseConnection, statements: Vec<String>) -> FixtureResult<()> {
    let batch_size = conn.config().batch_size.max(1);
    for chunk in statements.chunks(batch_size) {
        conn.executor().execute_batch(chunk)?;
    }
    Ok(())
}

fn insert_statement(config: &DatabaseConfig, table: &dyn Table, row: usize) -> FixtureResult<String> {
    let metadata = table.metadata();
    let columns = metadata.columns();
    let names: Vec<&str> = columns.iter().map(|c| c.name()).collect();
    let values = table
        .row_values(row)?
        .iter()
        .map(sql_literal)
        .collect::<Vec<_>>();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        config.table_ref(metadata.table_name()),
        names.join(", "),
        values.join(", ")
    ))
}

fn primary_key_clause(table: &dyn Table, row: usize) -> FixtureResult<String> {
    let metadata = table.metadata();
    if !metadata.has_primary_keys() {
        return Err(FixtureError::structure(format!(
            "table '{}' has no primary key",
            metadata.table_name()
        )));
    }
    let terms = metadata
        .primary_key_columns()
        .map(|c| {
            let v = table.value(row, c.name())?;
            Ok(format!("{} = {}", c.name(), sql_literal(&v)))
        })
        .collect::<FixtureResult<Vec<String>>>()?;
    Ok(terms.join(" AND "))
}

fn update_statement(config: &DatabaseConfig, table: &dyn Table, row: usize) -> FixtureResult<String> {
    let metadata = table.metadata();
    let is_key = |name: &str| {
        metadata
            .primary_key_columns()
            .any(|k| k.name_matches(name, metadata.policy()))
    };
    let assignments = metadata
        .columns()
        .iter()
        .filter(|c| !is_key(c.name()))
        .map(|c| {
            let v = table.value(row, c.name())?;
            Ok(format!("{} = {}", c.name(), sql_literal(&v)))
        })
        .collect::<FixtureResult<Vec<String>>>()?;
    if assignments.is_empty() {
        return Err(FixtureError::structure(format!(
            "table '{}' has no non-key columns to update",
            metadata.table_name()
        )));
    }
    Ok(format!(
        "UPDATE {} SET {} WHERE {}",
        config.table_ref(metadata.table_name()),
        assignments.join(", "),
        primary_key_clause(table, row)?
    ))
}

fn require_columns(table: &dyn Table) -> FixtureResult<()> {
    if table.metadata().columns().is_empty() {
        return Err(FixtureError::structure(format!(
            "table '{}' declares no columns",
            table.metadata().table_name()
        )));
    }
    Ok(())
}

fn insert(dataset: &dyn DataSet, conn: &mut dyn DatabaseConnection) -> FixtureResult<()> {
    let config = conn.config().clone();
    for table in dataset.tables()? {
        require_columns(&table)?;
        let statements = (0..table.row_count())
            .map(|row| insert_statement(&config, &table, row))
            .collect::<FixtureResult<Vec<String>>>()?;
        submit(conn, statements)?;
    }
    Ok(())
}

fn update(dataset: &dyn DataSet, conn: &mut dyn DatabaseConnection) -> FixtureResult<()> {
    let config = conn.config().clone();
    for table in dataset.tables()? {
        require_columns(&table)?;
        let statements = (0..table.row_count())
            .map(|row| update_statement(&config, &table, row))
            .collect::<FixtureResult<Vec<String>>>()?;
        submit(conn, statements)?;
    }
    Ok(())
}

fn delete(dataset: &dyn DataSet, conn: &mut dyn DatabaseConnection) -> FixtureResult<()> {
    let config = conn.config().clone();
    for table in dataset.tables_reversed()? {
        require_columns(&table)?;
        // Rows in reverse as well, mirroring the table ordering rule.
        let statements = (0..table.row_count())
            .rev()
            .map(|row| {
                Ok(format!(
                    "DELETE FROM {} WHERE {}",
                    config.table_ref(table.metadata().table_name()),
                    primary_key_clause(&table, row)?
                ))
            })
            .collect::<FixtureResult<Vec<String>>>()?;
        submit(conn, statements)?;
    }
    Ok(())
}

fn delete_all(
    dataset: &dyn DataSet,
    conn: &mut dyn DatabaseConnection,
    verb: &str,
) -> FixtureResult<()> {
    let config = conn.config().clone();
    let statements = dataset
        .tables_reversed()?
        .iter()
        .map(|t| format!("{verb} {}", config.table_ref(t.metadata().table_name())))
        .collect();
    submit(conn, statements)
}

fn refresh(dataset: &dyn DataSet, conn: &mut dyn DatabaseConnection) -> FixtureResult<()> {
    let config = conn.config().clone();
    for table in dataset.tables()? {
        require_columns(&table)?;
        for row in 0..table.row_count() {
            let updated = conn.executor().execute(&update_statement(&config, &table, row)?)?;
            if updated == 0 {
                conn.executor().execute(&insert_statement(&config, &table, row)?)?;
            }
        }
    }
    Ok(())
}

/// Observer for cycle-level events.
pub trait OperationListener {
    /// A body fault was shadowed by a cleanup fault (see [`run_cycle`]).
    fn on_shadowed_fault(&self, _fault: &FixtureError) {}
}

/// Run `body` against a connection scoped to one setup/verify/teardown cycle.
///
/// The connection is closed on every exit path. A close failure indicates the
/// database may be left in an indeterminate state, so it takes precedence as
/// the reported error even when the body already failed; the shadowed body
/// fault is logged (to the listener when given, else stderr) rather than
/// silently dropped.
pub fn run_cycle<C, F, T>(
    conn: &mut C,
    listener: Option<&dyn OperationListener>,
    body: F,
) -> FixtureResult<T>
where
    C: DatabaseConnection + ?Sized,
    F: FnOnce(&mut C) -> FixtureResult<T>,
{
    let result = body(conn);
    match conn.close() {
        Ok(()) => result,
        Err(cleanup) => {
            if let Err(original) = result {
                match listener {
                    Some(l) => l.on_shadowed_fault(&original),
                    None => eprintln!("[fixture][cleanup] shadowed fault: {original}"),
                }
            }
            Err(cleanup)
        }
    }
}
