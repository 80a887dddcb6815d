//! The dataset data model: columns, metadata, tables, and the decorators that
//! re-order, filter, combine, or substitute over them.
//!
//! A [`DataSet`] is an ordered collection of named [`Table`]s. Table names are
//! unique under the dataset's [`CaseSensitivity`] policy and iterate in
//! insertion order (or reversed, for teardown processing). Decorators
//! implement the same contracts while changing row order ([`SortedTable`]),
//! visible columns ([`filtered`]), source combination ([`CompositeDataSet`]),
//! or cell tokens ([`ReplacementDataSet`]).

pub mod column;
pub mod composite;
pub mod filtered;
pub mod map;
pub mod metadata;
pub mod replacement;
pub mod sorted;
pub mod stream;
pub mod table;

pub use column::{compare_values, Column, DataType, Nullable, Value};
pub use composite::{CompositeDataSet, MergeMode};
pub use filtered::{ExcludedColumnsTable, IncludedColumnsTable, RowFilterTable};
pub use map::{CaseSensitivity, DuplicateMode, OrderedNameMap};
pub use metadata::TableMetaData;
pub use replacement::{ReplacementDataSet, ReplacementTable};
pub use sorted::SortedTable;
pub use stream::{DataSetBuilder, DataSetConsumer, DataSetProducer};
pub use table::{DefaultTable, ForwardOnlyTable, Table, TableRef};

use std::cell::Cell;

use crate::error::{FixtureError, FixtureResult};

/// An ordered collection of named tables.
pub trait DataSet: std::fmt::Debug {
    /// The policy table names resolve under.
    fn case_sensitivity(&self) -> CaseSensitivity;

    /// Table names in insertion order, with their original spelling.
    fn table_names(&self) -> Vec<String>;

    /// Look up one table by name.
    fn table(&self, name: &str) -> FixtureResult<TableRef<'_>>;

    /// All tables in insertion order.
    fn tables(&self) -> FixtureResult<Vec<TableRef<'_>>> {
        self.table_names()
            .iter()
            .map(|n| self.table(n))
            .collect()
    }

    /// All tables in reverse insertion order (teardown processing).
    fn tables_reversed(&self) -> FixtureResult<Vec<TableRef<'_>>> {
        let mut tables = self.tables()?;
        tables.reverse();
        Ok(tables)
    }
}

/// The default in-memory dataset.
#[derive(Debug, Clone)]
pub struct DefaultDataSet {
    tables: OrderedNameMap<DefaultTable>,
}

impl DefaultDataSet {
    /// Create an empty dataset under `policy`.
    pub fn new(policy: CaseSensitivity) -> Self {
        Self {
            tables: OrderedNameMap::new(policy),
        }
    }

    /// Add a table; a duplicate name under the policy is a structure fault.
    pub fn add_table(&mut self, table: DefaultTable) -> FixtureResult<()> {
        let name = table.metadata().table_name().to_owned();
        self.tables.insert(&name, table, DuplicateMode::Reject)
    }

    /// Add a table, replacing any same-named table already present.
    pub fn add_or_replace_table(&mut self, table: DefaultTable) -> FixtureResult<()> {
        let name = table.metadata().table_name().to_owned();
        self.tables.insert(&name, table, DuplicateMode::Replace)
    }

    /// Direct access to a stored table, without boxing.
    pub fn get_table(&self, name: &str) -> Option<&DefaultTable> {
        self.tables.get(name)
    }

    pub(crate) fn get_table_mut(&mut self, name: &str) -> Option<&mut DefaultTable> {
        self.tables.get_mut(name)
    }
}

impl DataSet for DefaultDataSet {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.tables.policy()
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.names().map(str::to_owned).collect()
    }

    fn table(&self, name: &str) -> FixtureResult<TableRef<'_>> {
        self.tables
            .get(name)
            .map(|t| Box::new(t) as TableRef<'_>)
            .ok_or_else(|| FixtureError::NoSuchTable {
                table: name.to_owned(),
            })
    }
}

/// A single-pass view over a dataset: tables must be visited in insertion
/// order, and a table (or row) behind the cursor cannot be revisited.
#[derive(Debug)]
pub struct ForwardOnlyDataSet<D: DataSet> {
    inner: D,
    cursor: Cell<usize>,
}

impl<D: DataSet> ForwardOnlyDataSet<D> {
    /// Wrap `inner` with a forward-only access discipline.
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cursor: Cell::new(0),
        }
    }
}

impl<D: DataSet> DataSet for ForwardOnlyDataSet<D> {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.inner.case_sensitivity()
    }

    fn table_names(&self) -> Vec<String> {
        self.inner.table_names()
    }

    fn table(&self, name: &str) -> FixtureResult<TableRef<'_>> {
        let policy = self.case_sensitivity();
        let names = self.inner.table_names();
        let pos = names
            .iter()
            .position(|n| policy.matches(n, name))
            .ok_or_else(|| FixtureError::NoSuchTable {
                table: name.to_owned(),
            })?;
        if pos < self.cursor.get() {
            return Err(FixtureError::structure(format!(
                "forward-only dataset: table '{name}' was already passed"
            )));
        }
        self.cursor.set(pos);
        let table = self.inner.table(name)?;
        Ok(Box::new(ForwardOnlyTable::new(table)))
    }
}
