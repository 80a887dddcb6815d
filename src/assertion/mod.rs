//! Expected-vs-actual verification.
//!
//! Comparison enumerates the rows both tables have and, per compared column,
//! invokes a pluggable value-comparison strategy (type-aware equality by
//! default, overridable per column). Mismatches are accumulated across the
//! whole table, and across a whole dataset, so a single verification pass
//! reports the full discrepancy set rather than the first difference.
//!
//! When an externally supplied expected table declares all-`Unknown`
//! datatypes (flat files and JSON cannot express SQL types), the actual
//! table's concrete column types are adopted by case-insensitive name match,
//! so coercion uses the authoritative database types. Actual columns absent
//! from the expected table are dropped from the compared set.

use std::fmt;

use serde::Serialize;

use crate::dataset::column::{Column, DataType, Value};
use crate::dataset::map::CaseSensitivity;
use crate::dataset::{DataSet, Table};
use crate::error::{FixtureError, FixtureResult};

/// One expected-vs-actual cell mismatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Difference {
    /// Table the mismatch is in.
    pub table: String,
    /// Zero-based row index.
    pub row: usize,
    /// Column name as declared by the expected table.
    pub column: String,
    /// Expected cell value.
    pub expected: Value,
    /// Actual cell value.
    pub actual: Value,
}

/// A row-count mismatch between expected and actual tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowCountMismatch {
    /// Table the mismatch is in.
    pub table: String,
    /// Expected row count.
    pub expected: usize,
    /// Actual row count.
    pub actual: usize,
}

/// The accumulated result of a failed verification pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonFailure {
    /// Row-count mismatches, one per affected table.
    pub row_counts: Vec<RowCountMismatch>,
    /// Cell differences, in table/row/column discovery order.
    pub differences: Vec<Difference>,
}

impl ComparisonFailure {
    /// Whether any mismatch was recorded.
    pub fn is_empty(&self) -> bool {
        self.row_counts.is_empty() && self.differences.is_empty()
    }
}

impl fmt::Display for ComparisonFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verification failed: {} row-count mismatch(es), {} cell difference(s)",
            self.row_counts.len(),
            self.differences.len()
        )?;
        for rc in &self.row_counts {
            write!(
                f,
                "\n  table '{}': expected {} row(s), actual {}",
                rc.table, rc.expected, rc.actual
            )?;
        }
        for d in &self.differences {
            write!(
                f,
                "\n  table '{}' row {} column '{}': expected '{}', actual '{}'",
                d.table, d.row, d.column, d.expected, d.actual
            )?;
        }
        Ok(())
    }
}

/// Receives mismatches as comparison discovers them.
///
/// The default implementation is [`DifferenceCollector`]; custom handlers can
/// stream mismatches elsewhere (a report file, a test harness).
pub trait FailureHandler {
    /// A cell difference was found.
    fn difference(&mut self, difference: Difference);

    /// Expected and actual tables disagree on row count.
    fn row_count(&mut self, mismatch: RowCountMismatch);
}

/// Accumulates mismatches into a [`ComparisonFailure`].
#[derive(Debug, Default)]
pub struct DifferenceCollector {
    failure: ComparisonFailure,
}

impl DifferenceCollector {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// `Ok(())` if nothing was collected, else the aggregated verification
    /// fault.
    pub fn into_result(self) -> FixtureResult<()> {
        if self.failure.is_empty() {
            Ok(())
        } else {
            Err(FixtureError::Verification(Box::new(self.failure)))
        }
    }
}

impl FailureHandler for DifferenceCollector {
    fn difference(&mut self, difference: Difference) {
        self.failure.differences.push(difference);
    }

    fn row_count(&mut self, mismatch: RowCountMismatch) {
        self.failure.row_counts.push(mismatch);
    }
}

/// Pluggable per-column value comparison strategy.
pub trait ValueComparer {
    /// Whether `expected` and `actual` agree, after coercion to `data_type`.
    fn matches(&self, expected: &Value, actual: &Value, data_type: DataType)
        -> FixtureResult<bool>;
}

/// Type-aware equality: both sides are coerced to the compared column's
/// datatype, then compared for equality.
#[derive(Debug, Default)]
pub struct DefaultComparer;

impl ValueComparer for DefaultComparer {
    fn matches(
        &self,
        expected: &Value,
        actual: &Value,
        data_type: DataType,
    ) -> FixtureResult<bool> {
        Ok(data_type.coerce(expected)? == data_type.coerce(actual)?)
    }
}

/// A configured comparison pass.
pub struct Comparison {
    default: Box<dyn ValueComparer>,
    per_column: Vec<(String, Box<dyn ValueComparer>)>,
}

impl Default for Comparison {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparison {
    /// Type-aware equality everywhere.
    pub fn new() -> Self {
        Self {
            default: Box::new(DefaultComparer),
            per_column: Vec::new(),
        }
    }

    /// Override the strategy for one column (matched case-insensitively).
    pub fn with_comparer(mut self, column: &str, comparer: Box<dyn ValueComparer>) -> Self {
        self.per_column.push((column.to_owned(), comparer));
        self
    }

    fn comparer_for(&self, column: &str) -> &dyn ValueComparer {
        self.per_column
            .iter()
            .find(|(name, _)| CaseSensitivity::Insensitive.matches(name, column))
            .map(|(_, c)| c.as_ref())
            .unwrap_or(self.default.as_ref())
    }

    /// Compare two tables, accumulating every mismatch; the aggregated
    /// verification fault is returned once, after the full pass.
    pub fn compare_tables(&self, expected: &dyn Table, actual: &dyn Table) -> FixtureResult<()> {
        let mut collector = DifferenceCollector::new();
        self.compare_tables_with(expected, actual, &mut collector)?;
        collector.into_result()
    }

    /// Compare two tables into a caller-supplied handler.
    pub fn compare_tables_with(
        &self,
        expected: &dyn Table,
        actual: &dyn Table,
        handler: &mut dyn FailureHandler,
    ) -> FixtureResult<()> {
        let table = expected.metadata().table_name().to_owned();
        let columns = reconcile_columns(expected, actual)?;

        if expected.row_count() != actual.row_count() {
            handler.row_count(RowCountMismatch {
                table: table.clone(),
                expected: expected.row_count(),
                actual: actual.row_count(),
            });
        }

        let common_rows = expected.row_count().min(actual.row_count());
        for row in 0..common_rows {
            for column in &columns {
                let name = column.name();
                let expected_value = expected.value(row, name)?;
                let actual_value = actual.value(row, name)?;
                let matches = self.comparer_for(name).matches(
                    &expected_value,
                    &actual_value,
                    column.data_type(),
                )?;
                if !matches {
                    handler.difference(Difference {
                        table: table.clone(),
                        row,
                        column: name.to_owned(),
                        expected: expected_value,
                        actual: actual_value,
                    });
                }
            }
        }
        Ok(())
    }

    /// Compare two datasets table by table, in the expected dataset's order.
    ///
    /// A table missing from the actual dataset is a no-such-table fault;
    /// value and row-count mismatches accumulate across all tables into one
    /// verification fault.
    pub fn compare_datasets(
        &self,
        expected: &dyn DataSet,
        actual: &dyn DataSet,
    ) -> FixtureResult<()> {
        let mut collector = DifferenceCollector::new();
        for name in expected.table_names() {
            let expected_table = expected.table(&name)?;
            let actual_table = actual.table(&name)?;
            self.compare_tables_with(&expected_table, &actual_table, &mut collector)?;
        }
        collector.into_result()
    }
}

/// The column set and datatypes a comparison runs under.
///
/// The compared columns are the expected table's columns. When every expected
/// column is `Unknown`-typed, each adopts the actual table's datatype for the
/// same-named column (case-insensitive); actual columns with no expected
/// counterpart take no part in the comparison.
fn reconcile_columns(expected: &dyn Table, actual: &dyn Table) -> FixtureResult<Vec<Column>> {
    let expected_columns = expected.metadata().columns();
    let all_unknown = expected_columns
        .iter()
        .all(|c| c.data_type() == DataType::Unknown);
    if !all_unknown {
        return Ok(expected_columns.to_vec());
    }

    expected_columns
        .iter()
        .map(|c| {
            let actual_column = actual.metadata().column(c.name())?;
            Ok(Column::new(c.name(), actual_column.data_type()).with_nullable(c.nullable()))
        })
        .collect()
}

/// Assert two tables are equal under the default comparison.
pub fn assert_tables_equal(expected: &dyn Table, actual: &dyn Table) -> FixtureResult<()> {
    Comparison::new().compare_tables(expected, actual)
}

/// Assert two datasets are equal under the default comparison.
pub fn assert_datasets_equal(expected: &dyn DataSet, actual: &dyn DataSet) -> FixtureResult<()> {
    Comparison::new().compare_datasets(expected, actual)
}
