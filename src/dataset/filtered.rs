//! Column- and row-filtering decorators.

use crate::dataset::column::Value;
use crate::dataset::metadata::TableMetaData;
use crate::dataset::table::{row_bounds_check, Table};
use crate::error::FixtureResult;

fn project_metadata(source: &TableMetaData, keep: &[bool]) -> FixtureResult<TableMetaData> {
    let columns = source
        .columns()
        .iter()
        .zip(keep.iter())
        .filter(|&(_, &k)| k)
        .map(|(c, _)| c.clone())
        .collect();
    let pk_names: Vec<String> = source
        .primary_key_columns()
        .filter(|c| {
            source
                .column_index(c.name())
                .map(|i| keep[i])
                .unwrap_or(false)
        })
        .map(|c| c.name().to_owned())
        .collect();
    let refs: Vec<&str> = pk_names.iter().map(String::as_str).collect();
    TableMetaData::new(source.table_name(), columns, source.policy()).with_primary_keys(&refs)
}

/// A view exposing only the columns named by an include filter.
///
/// `None` means "no filter": every column stays visible. `Some(&[])` means
/// "no columns visible". The two are deliberately distinct, and downstream
/// comparison results depend on the distinction. Listed names that do not
/// exist in the source are ignored. Requesting a filtered-out column by name
/// is a no-such-column fault.
#[derive(Debug)]
pub struct IncludedColumnsTable<T: Table> {
    inner: T,
    metadata: TableMetaData,
}

impl<T: Table> IncludedColumnsTable<T> {
    /// Restrict `inner` to the columns in `include` (see type docs for the
    /// `None` vs. empty-list distinction).
    pub fn new(inner: T, include: Option<&[&str]>) -> FixtureResult<Self> {
        let source = inner.metadata();
        let policy = source.policy();
        let keep: Vec<bool> = source
            .columns()
            .iter()
            .map(|c| match include {
                None => true,
                Some(names) => names.iter().any(|n| c.name_matches(n, policy)),
            })
            .collect();
        let metadata = project_metadata(source, &keep)?;
        Ok(Self { inner, metadata })
    }
}

impl<T: Table> Table for IncludedColumnsTable<T> {
    fn metadata(&self) -> &TableMetaData {
        &self.metadata
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        // Resolve against the restricted metadata first, so filtered-out
        // columns fault here rather than leak through.
        self.metadata.column_index(column)?;
        self.inner.value(row, column)
    }
}

/// A view hiding the columns named by an exclude filter.
#[derive(Debug)]
pub struct ExcludedColumnsTable<T: Table> {
    inner: T,
    metadata: TableMetaData,
}

impl<T: Table> ExcludedColumnsTable<T> {
    /// Hide the listed columns of `inner`; names that do not exist are ignored.
    pub fn new(inner: T, exclude: &[&str]) -> FixtureResult<Self> {
        let source = inner.metadata();
        let policy = source.policy();
        let keep: Vec<bool> = source
            .columns()
            .iter()
            .map(|c| !exclude.iter().any(|n| c.name_matches(n, policy)))
            .collect();
        let metadata = project_metadata(source, &keep)?;
        Ok(Self { inner, metadata })
    }
}

impl<T: Table> Table for ExcludedColumnsTable<T> {
    fn metadata(&self) -> &TableMetaData {
        &self.metadata
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        self.metadata.column_index(column)?;
        self.inner.value(row, column)
    }
}

/// A view keeping only the rows a predicate accepts, preserving their order.
#[derive(Debug)]
pub struct RowFilterTable<T: Table> {
    inner: T,
    keep: Vec<usize>,
}

impl<T: Table> RowFilterTable<T> {
    /// Keep the rows for which `predicate` returns true. The predicate sees
    /// each row's values in metadata column order.
    pub fn new<F>(inner: T, mut predicate: F) -> FixtureResult<Self>
    where
        F: FnMut(&[Value]) -> bool,
    {
        let mut keep = Vec::new();
        for row in 0..inner.row_count() {
            let values = inner.row_values(row)?;
            if predicate(&values) {
                keep.push(row);
            }
        }
        Ok(Self { inner, keep })
    }
}

impl<T: Table> Table for RowFilterTable<T> {
    fn metadata(&self) -> &TableMetaData {
        self.inner.metadata()
    }

    fn row_count(&self) -> usize {
        self.keep.len()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        row_bounds_check(self.metadata(), row, self.row_count())?;
        self.inner.value(self.keep[row], column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::{Column, DataType};
    use crate::dataset::map::CaseSensitivity;
    use crate::dataset::table::DefaultTable;

    fn table() -> DefaultTable {
        let meta = TableMetaData::new(
            "T",
            vec![
                Column::new("A", DataType::Integer),
                Column::new("B", DataType::Varchar),
                Column::new("C", DataType::Boolean),
            ],
            CaseSensitivity::Insensitive,
        )
        .with_primary_keys(&["A"])
        .unwrap();
        let mut t = DefaultTable::new(meta);
        t.add_row(vec![
            Value::Integer(1),
            Value::Text("x".to_string()),
            Value::Boolean(true),
        ])
        .unwrap();
        t.add_row(vec![
            Value::Integer(2),
            Value::Text("y".to_string()),
            Value::Boolean(false),
        ])
        .unwrap();
        t
    }

    #[test]
    fn absent_include_filter_keeps_all_columns() {
        let view = IncludedColumnsTable::new(table(), None).unwrap();
        assert_eq!(view.metadata().columns().len(), 3);
    }

    #[test]
    fn empty_include_filter_keeps_no_columns() {
        let view = IncludedColumnsTable::new(table(), Some(&[])).unwrap();
        assert_eq!(view.metadata().columns().len(), 0);
        let err = view.value(0, "A").unwrap_err();
        assert!(err.to_string().contains("no such column"));
    }

    #[test]
    fn include_filter_restricts_and_faults_on_hidden_columns() {
        let view = IncludedColumnsTable::new(table(), Some(&["b"])).unwrap();
        assert_eq!(view.metadata().columns().len(), 1);
        assert_eq!(view.value(0, "B").unwrap(), Value::Text("x".to_string()));
        assert!(view.value(0, "A").is_err());
    }

    #[test]
    fn exclude_filter_hides_listed_columns_and_their_pk_entries() {
        let view = ExcludedColumnsTable::new(table(), &["a"]).unwrap();
        assert_eq!(view.metadata().columns().len(), 2);
        assert!(!view.metadata().has_primary_keys());
        assert!(view.value(0, "A").is_err());
    }

    #[test]
    fn row_filter_keeps_matching_rows_in_order() {
        let view = RowFilterTable::new(table(), |row| {
            matches!(row.last(), Some(Value::Boolean(true)))
        })
        .unwrap();
        assert_eq!(view.row_count(), 1);
        assert_eq!(view.value(0, "A").unwrap(), Value::Integer(1));
        assert!(view.value(1, "A").is_err());
    }
}
