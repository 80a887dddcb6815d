//! Token-substitution decorator.

use crate::dataset::column::Value;
use crate::dataset::map::CaseSensitivity;
use crate::dataset::metadata::TableMetaData;
use crate::dataset::table::{Table, TableRef};
use crate::dataset::DataSet;
use crate::error::FixtureResult;

/// A dataset view substituting designated token values as cells are read.
///
/// The canonical use is a null marker: flat formats cannot express SQL NULL,
/// so a loader-visible token (e.g. `[NULL]`) is mapped to [`Value::Null`] at
/// read time. The underlying dataset is never mutated.
#[derive(Debug)]
pub struct ReplacementDataSet<D: DataSet> {
    inner: D,
    substitutions: Vec<(Value, Value)>,
}

impl<D: DataSet> ReplacementDataSet<D> {
    /// Wrap `inner` with an empty substitution set.
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            substitutions: Vec::new(),
        }
    }

    /// Map every cell exactly equal to `from` into `to`.
    pub fn add_replacement(&mut self, from: Value, to: Value) {
        self.substitutions.push((from, to));
    }

    /// Builder form of [`Self::add_replacement`].
    pub fn with_replacement(mut self, from: Value, to: Value) -> Self {
        self.add_replacement(from, to);
        self
    }

    /// Convenience for the null-marker case.
    pub fn with_null_token(self, token: impl Into<String>) -> Self {
        self.with_replacement(Value::Text(token.into()), Value::Null)
    }
}

impl<D: DataSet> DataSet for ReplacementDataSet<D> {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.inner.case_sensitivity()
    }

    fn table_names(&self) -> Vec<String> {
        self.inner.table_names()
    }

    fn table(&self, name: &str) -> FixtureResult<TableRef<'_>> {
        let inner = self.inner.table(name)?;
        Ok(Box::new(ReplacementTable {
            inner,
            substitutions: &self.substitutions,
        }))
    }
}

/// The per-table view a [`ReplacementDataSet`] hands out.
#[derive(Debug)]
pub struct ReplacementTable<'a, T: Table> {
    inner: T,
    substitutions: &'a [(Value, Value)],
}

impl<'a, T: Table> ReplacementTable<'a, T> {
    /// Wrap a single table with a substitution set.
    pub fn new(inner: T, substitutions: &'a [(Value, Value)]) -> Self {
        Self {
            inner,
            substitutions,
        }
    }
}

impl<T: Table> Table for ReplacementTable<'_, T> {
    fn metadata(&self) -> &TableMetaData {
        self.inner.metadata()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        let value = self.inner.value(row, column)?;
        Ok(self
            .substitutions
            .iter()
            .find(|(from, _)| *from == value)
            .map(|(_, to)| to.clone())
            .unwrap_or(value))
    }
}
