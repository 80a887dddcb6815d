//! Row-order decorator.

use std::cmp::Ordering;

use crate::dataset::column::{compare_values, Value};
use crate::dataset::metadata::TableMetaData;
use crate::dataset::table::{row_bounds_check, Table};
use crate::error::FixtureResult;

/// A table whose rows are presented in ascending order of the given sort
/// columns, later columns breaking ties on earlier ones.
///
/// With `use_comparable`, values order naturally (numbers numerically, dates
/// chronologically) instead of by rendered string. The permutation is fixed at
/// construction and deterministic for a given table content; stability on
/// equal keys is not part of the contract.
#[derive(Debug)]
pub struct SortedTable<T: Table> {
    inner: T,
    permutation: Vec<usize>,
}

impl<T: Table> SortedTable<T> {
    /// Sort by the given columns, in the given precedence order.
    ///
    /// Each name must resolve in the inner table's metadata.
    pub fn by_columns(inner: T, columns: &[&str], use_comparable: bool) -> FixtureResult<Self> {
        let indices = columns
            .iter()
            .map(|name| inner.metadata().column_index(name))
            .collect::<FixtureResult<Vec<usize>>>()?;
        Self::build(inner, indices, use_comparable)
    }

    /// Sort by every declared column, in declaration order.
    pub fn by_all_columns(inner: T, use_comparable: bool) -> FixtureResult<Self> {
        let indices = (0..inner.metadata().columns().len()).collect();
        Self::build(inner, indices, use_comparable)
    }

    fn build(inner: T, indices: Vec<usize>, use_comparable: bool) -> FixtureResult<Self> {
        let columns = inner.metadata().columns();
        let mut keys: Vec<Vec<Value>> = Vec::with_capacity(inner.row_count());
        for row in 0..inner.row_count() {
            let key = indices
                .iter()
                .map(|&i| inner.value(row, columns[i].name()))
                .collect::<FixtureResult<Vec<Value>>>()?;
            keys.push(key);
        }

        let mut permutation: Vec<usize> = (0..inner.row_count()).collect();
        permutation.sort_by(|&a, &b| {
            for (x, y) in keys[a].iter().zip(keys[b].iter()) {
                match compare_values(x, y, use_comparable) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        });

        Ok(Self { inner, permutation })
    }
}

impl<T: Table> Table for SortedTable<T> {
    fn metadata(&self) -> &TableMetaData {
        self.inner.metadata()
    }

    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn value(&self, row: usize, column: &str) -> FixtureResult<Value> {
        row_bounds_check(self.metadata(), row, self.row_count())?;
        self.inner.value(self.permutation[row], column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::{Column, DataType};
    use crate::dataset::map::CaseSensitivity;
    use crate::dataset::table::DefaultTable;

    fn scores() -> DefaultTable {
        let meta = TableMetaData::new(
            "SCORES",
            vec![
                Column::new("GROUP", DataType::Varchar),
                Column::new("N", DataType::Integer),
            ],
            CaseSensitivity::Insensitive,
        );
        let mut t = DefaultTable::new(meta);
        for (g, n) in [("b", 2), ("a", 10), ("a", 2), ("b", 1)] {
            t.add_row(vec![Value::Text(g.to_string()), Value::Integer(n)])
                .unwrap();
        }
        t
    }

    #[test]
    fn adjacent_rows_are_nondecreasing_on_sort_keys() {
        let sorted = SortedTable::by_columns(scores(), &["GROUP", "N"], true).unwrap();
        for row in 0..sorted.row_count() - 1 {
            let g0 = sorted.value(row, "GROUP").unwrap();
            let g1 = sorted.value(row + 1, "GROUP").unwrap();
            let ord = compare_values(&g0, &g1, true);
            assert_ne!(ord, Ordering::Greater);
            if ord == Ordering::Equal {
                let n0 = sorted.value(row, "N").unwrap();
                let n1 = sorted.value(row + 1, "N").unwrap();
                assert_ne!(compare_values(&n0, &n1, true), Ordering::Greater);
            }
        }
    }

    #[test]
    fn comparable_ordering_differs_from_lexical() {
        let typed = SortedTable::by_columns(scores(), &["N"], true).unwrap();
        assert_eq!(typed.value(0, "N").unwrap(), Value::Integer(1));
        assert_eq!(typed.value(3, "N").unwrap(), Value::Integer(10));

        let lexical = SortedTable::by_columns(scores(), &["N"], false).unwrap();
        // "10" < "1"? No: "1" == prefix; lexically "1" < "10" < "2".
        assert_eq!(lexical.value(0, "N").unwrap(), Value::Integer(1));
        assert_eq!(lexical.value(1, "N").unwrap(), Value::Integer(10));
    }

    #[test]
    fn unknown_sort_column_faults() {
        let err = SortedTable::by_columns(scores(), &["NOPE"], true).unwrap_err();
        assert!(err.to_string().contains("no such column"));
    }
}
