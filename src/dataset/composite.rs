//! Multi-source dataset combination.

use crate::dataset::map::CaseSensitivity;
use crate::dataset::table::{DefaultTable, Table, TableRef};
use crate::dataset::{DataSet, DefaultDataSet};
use crate::error::FixtureResult;

/// How same-named tables from different sources are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Rows of later sources are appended to the first occurrence's table.
    Combine,
    /// A later source's table replaces the earlier one (position kept).
    Replace,
}

/// A dataset assembled from several source datasets.
///
/// Tables keep the order of their first occurrence across the sources. Rows
/// merged under [`MergeMode::Combine`] are re-keyed by column name into the
/// first occurrence's metadata; a later table missing one of those columns is
/// a no-such-column fault. The sources are read once at construction and not
/// referenced afterward.
#[derive(Debug)]
pub struct CompositeDataSet {
    combined: DefaultDataSet,
}

impl CompositeDataSet {
    /// Merge `sources` in order under `policy`.
    pub fn new(
        policy: CaseSensitivity,
        sources: &[&dyn DataSet],
        mode: MergeMode,
    ) -> FixtureResult<Self> {
        let mut combined = DefaultDataSet::new(policy);
        for source in sources {
            for table in source.tables()? {
                let name = table.metadata().table_name().to_owned();
                if combined.get_table(&name).is_none() {
                    combined.add_table(materialize(&table)?)?;
                    continue;
                }
                match mode {
                    MergeMode::Replace => {
                        combined.add_or_replace_table(materialize(&table)?)?;
                    }
                    MergeMode::Combine => {
                        let Some(existing) = combined.get_table_mut(&name) else {
                            continue;
                        };
                        let columns: Vec<String> = existing
                            .metadata()
                            .columns()
                            .iter()
                            .map(|c| c.name().to_owned())
                            .collect();
                        for row in 0..table.row_count() {
                            let values = columns
                                .iter()
                                .map(|c| table.value(row, c))
                                .collect::<FixtureResult<Vec<_>>>()?;
                            existing.add_row(values)?;
                        }
                    }
                }
            }
        }
        Ok(Self { combined })
    }
}

fn materialize(table: &TableRef<'_>) -> FixtureResult<DefaultTable> {
    let mut copy = DefaultTable::new(table.metadata().clone());
    for row in 0..table.row_count() {
        copy.add_row(table.row_values(row)?)?;
    }
    Ok(copy)
}

impl DataSet for CompositeDataSet {
    fn case_sensitivity(&self) -> CaseSensitivity {
        self.combined.case_sensitivity()
    }

    fn table_names(&self) -> Vec<String> {
        self.combined.table_names()
    }

    fn table(&self, name: &str) -> FixtureResult<TableRef<'_>> {
        self.combined.table(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::{Column, DataType, Value};
    use crate::dataset::metadata::TableMetaData;

    fn dataset_with(name: &str, ids: &[i64]) -> DefaultDataSet {
        let mut ds = DefaultDataSet::new(CaseSensitivity::Insensitive);
        let meta = TableMetaData::new(
            name,
            vec![Column::new("ID", DataType::Integer)],
            CaseSensitivity::Insensitive,
        );
        let mut t = DefaultTable::new(meta);
        for &id in ids {
            t.add_row(vec![Value::Integer(id)]).unwrap();
        }
        ds.add_table(t).unwrap();
        ds
    }

    #[test]
    fn combine_appends_rows_of_same_named_tables() {
        let a = dataset_with("T", &[1, 2]);
        let b = dataset_with("t", &[3]);
        let merged =
            CompositeDataSet::new(CaseSensitivity::Insensitive, &[&a, &b], MergeMode::Combine)
                .unwrap();
        let t = merged.table("T").unwrap();
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.value(2, "ID").unwrap(), Value::Integer(3));
    }

    #[test]
    fn replace_takes_the_later_source() {
        let a = dataset_with("T", &[1, 2]);
        let b = dataset_with("T", &[9]);
        let merged =
            CompositeDataSet::new(CaseSensitivity::Insensitive, &[&a, &b], MergeMode::Replace)
                .unwrap();
        let t = merged.table("T").unwrap();
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.value(0, "ID").unwrap(), Value::Integer(9));
    }

    #[test]
    fn disjoint_tables_keep_first_occurrence_order() {
        let a = dataset_with("X", &[1]);
        let b = dataset_with("Y", &[2]);
        let merged =
            CompositeDataSet::new(CaseSensitivity::Insensitive, &[&a, &b], MergeMode::Combine)
                .unwrap();
        assert_eq!(merged.table_names(), vec!["X", "Y"]);
    }
}
