//! The table contract and its in-memory implementations.

use std::cell::Cell;
use std::sync::Arc;

use crate::dataset::column::Value;
use crate::dataset::metadata::TableMetaData;
use crate::error::{FixtureError, FixtureResult};

/// A 2-D value container addressed by row index and column name.
///
/// Implementations validate `row < row_count()` (row-bounds fault) and resolve
/// the column under the metadata's case-sensitivity policy (no-such-column
/// fault). A missing value is never returned silently.
pub trait Table: std::fmt::Debug {
    /// The shared, immutable metadata for this table.
    fn metadata(&self) -> &TableMetaData;

    /// Number of fully materialized rows.
    fn row_count(&self) -> usize;

    /// The value at (`row`, `column`), with `Value::Null` for SQL NULL.
    fn value(&self, row: usize, column: &str) -> FixtureResult<Value>;

    /// All values of one row, in metadata column order.
    fn row_values(&self, row: usize) -> FixtureResult<Vec<Value>> {
        self.metadata()
            .columns()
            .iter()
            .map(|c| self.value(row, c.name()))
            .collect()
    }
}

/// A borrowed or owning view of a table, as produced by dataset lookups.
pub type TableRef<'a> = Box<dyn Table + 'a>;

impl<T: Table + ?Sized> Table for &T {
    fn metadata(&self) -> &TableMetaData {
        (**self).metadata()
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        (**self).value(row, column)
    }
}

impl<T: Table + ?Sized> Table for Box<T> {
    fn metadata(&self) -> &TableMetaData {
        (**self).metadata()
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        (**self).value(row, column)
    }
}

pub(crate) fn row_bounds_check(
    metadata: &TableMetaData,
    row: usize,
    row_count: usize,
) -> FixtureResult<()> {
    if row >= row_count {
        return Err(FixtureError::RowOutOfBounds {
            row,
            row_count,
            table: metadata.table_name().to_owned(),
        });
    }
    Ok(())
}

/// The default in-memory table: append-only while loading, immutable after.
///
/// Values are coerced to the declared column datatype as they are written;
/// `Unknown` columns store values untouched.
#[derive(Debug, Clone)]
pub struct DefaultTable {
    metadata: Arc<TableMetaData>,
    rows: Vec<Vec<Value>>,
}

impl DefaultTable {
    /// Create an empty table over `metadata`.
    pub fn new(metadata: TableMetaData) -> Self {
        Self {
            metadata: Arc::new(metadata),
            rows: Vec::new(),
        }
    }

    /// Shared-metadata constructor, used when several tables present views of
    /// the same declaration.
    pub fn with_shared_metadata(metadata: Arc<TableMetaData>) -> Self {
        Self {
            metadata,
            rows: Vec::new(),
        }
    }

    /// The shared metadata handle.
    pub fn metadata_arc(&self) -> Arc<TableMetaData> {
        Arc::clone(&self.metadata)
    }

    /// Append one row, given in metadata column order.
    ///
    /// The row length must equal the column count (structure fault) and each
    /// value must coerce to its column's datatype (type-cast fault).
    pub fn add_row(&mut self, values: Vec<Value>) -> FixtureResult<()> {
        let columns = self.metadata.columns();
        if values.len() != columns.len() {
            return Err(FixtureError::structure(format!(
                "row has {} values but table '{}' declares {} columns",
                values.len(),
                self.metadata.table_name(),
                columns.len()
            )));
        }
        let row = columns
            .iter()
            .zip(values.iter())
            .map(|(col, v)| col.data_type().coerce(v))
            .collect::<FixtureResult<Vec<Value>>>()?;
        self.rows.push(row);
        Ok(())
    }
}

impl Table for DefaultTable {
    fn metadata(&self) -> &TableMetaData {
        &self.metadata
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        row_bounds_check(&self.metadata, row, self.row_count())?;
        let idx = self.metadata.column_index(column)?;
        Ok(self.rows[row][idx].clone())
    }
}

/// A single-pass view over a table.
///
/// Forward-only tables exist to bound memory when iterating large results:
/// they allow reading rows in nondecreasing order only. Reading a row behind
/// the cursor is a programming-error fault, not a recoverable condition.
#[derive(Debug)]
pub struct ForwardOnlyTable<T: Table> {
    inner: T,
    cursor: Cell<usize>,
}

impl<T: Table> ForwardOnlyTable<T> {
    /// Wrap `inner` with a forward-only access discipline.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            cursor: Cell::new(0),
        }
    }
}

impl<T: Table> Table for ForwardOnlyTable<T> {
    fn metadata(&self) -> &TableMetaData {
        self.inner.metadata()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        if row < self.cursor.get() {
            return Err(FixtureError::structure(format!(
                "forward-only table '{}': row {row} was already passed (cursor at {})",
                self.metadata().table_name(),
                self.cursor.get()
            )));
        }
        self.cursor.set(row);
        self.inner.value(row, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::{Column, DataType};
    use crate::dataset::map::CaseSensitivity;

    fn person_table() -> DefaultTable {
        let meta = TableMetaData::new(
            "PERSON",
            vec![
                Column::new("ID", DataType::Integer),
                Column::new("NAME", DataType::Varchar),
            ],
            CaseSensitivity::Insensitive,
        );
        let mut t = DefaultTable::new(meta);
        t.add_row(vec![Value::Integer(1), Value::Text("Ada".to_string())])
            .unwrap();
        t
    }

    #[test]
    fn value_lookup_is_policy_aware() {
        let t = person_table();
        assert_eq!(t.value(0, "name").unwrap(), Value::Text("Ada".to_string()));
    }

    #[test]
    fn row_out_of_bounds_always_faults() {
        let t = person_table();
        let err = t.value(1, "ID").unwrap_err();
        assert!(err.to_string().contains("row 1 out of bounds"));
    }

    #[test]
    fn write_boundary_coerces_to_declared_type() {
        let meta = TableMetaData::new(
            "T",
            vec![Column::new("N", DataType::Integer)],
            CaseSensitivity::Insensitive,
        );
        let mut t = DefaultTable::new(meta);
        t.add_row(vec![Value::Text("17".to_string())]).unwrap();
        assert_eq!(t.value(0, "N").unwrap(), Value::Integer(17));
    }

    #[test]
    fn short_row_is_structure_error() {
        let mut t = person_table();
        let err = t.add_row(vec![Value::Integer(2)]).unwrap_err();
        assert!(err.to_string().contains("declares 2 columns"));
    }

    #[test]
    fn forward_only_allows_rereading_the_current_row() {
        let fwd = ForwardOnlyTable::new(person_table());
        let _ = fwd.value(0, "ID").unwrap();
        // Same row, different column: still at the cursor.
        assert_eq!(fwd.value(0, "NAME").unwrap(), Value::Text("Ada".to_string()));
    }

    #[test]
    fn forward_only_rejects_rereading_a_passed_row() {
        let mut src = person_table();
        src.add_row(vec![Value::Integer(2), Value::Text("Grace".to_string())])
            .unwrap();
        let fwd = ForwardOnlyTable::new(src);
        let _ = fwd.value(1, "ID").unwrap();
        let err = fwd.value(0, "ID").unwrap_err();
        assert!(err.to_string().contains("already passed"));
    }
}
