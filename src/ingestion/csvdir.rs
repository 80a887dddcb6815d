//! Dataset directories: one delimited file per table plus an ordering file.
//!
//! A dataset directory contains `<TABLE>.csv` files (first record = column
//! names, remaining records = rows) and, optionally, a `table-ordering.txt`
//! control file listing table names one per line. With the control file,
//! tables load in exactly that order; without it, `*.csv` files load in
//! lexical filename order. Columns carry [`DataType::Unknown`]: flat files
//! cannot express SQL types, so comparison adopts the live table's types.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::dataset::column::{Column, DataType};
use crate::dataset::map::CaseSensitivity;
use crate::dataset::metadata::TableMetaData;
use crate::dataset::stream::{DataSetBuilder, DataSetConsumer, DataSetProducer};
use crate::dataset::DefaultDataSet;
use crate::error::{FixtureError, FixtureResult};
use crate::ingestion::flat::FlatDialect;

/// Name of the control file fixing table load order.
pub const TABLE_ORDERING_FILE: &str = "table-ordering.txt";

/// Extension of table files inside a dataset directory.
const TABLE_FILE_EXTENSION: &str = "csv";

/// Streams a dataset directory through the producer/consumer contract.
pub struct FlatDirProducer {
    dir: PathBuf,
    dialect: FlatDialect,
    policy: CaseSensitivity,
}

impl FlatDirProducer {
    /// Produce from `dir` using `dialect`, resolving names under `policy`.
    pub fn new(dir: impl AsRef<Path>, dialect: FlatDialect, policy: CaseSensitivity) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            dialect,
            policy,
        }
    }

    fn table_files(&self) -> FixtureResult<Vec<(String, PathBuf)>> {
        let ordering = self.dir.join(TABLE_ORDERING_FILE);
        if ordering.is_file() {
            let text = fs::read_to_string(&ordering)?;
            return Ok(text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(|name| {
                    (
                        name.to_owned(),
                        self.dir.join(format!("{name}.{TABLE_FILE_EXTENSION}")),
                    )
                })
                .collect());
        }

        // No control file: every *.csv in the directory, lexical order.
        let mut files: Vec<(String, PathBuf)> = WalkDir::new(&self.dir)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(TABLE_FILE_EXTENSION))
            })
            .filter_map(|e| {
                let stem = e.path().file_stem()?.to_str()?.to_owned();
                Some((stem, e.path().to_path_buf()))
            })
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(files)
    }

    fn produce_table(
        &self,
        name: &str,
        path: &Path,
        consumer: &mut dyn DataSetConsumer,
    ) -> FixtureResult<()> {
        let text = fs::read_to_string(path)?;
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or_else(|| {
            FixtureError::structure(format!("table file '{}' is empty", path.display()))
        })?;
        let columns: Vec<Column> = self
            .dialect
            .parse_record(header)?
            .into_iter()
            .map(|name| Column::new(name.trim(), DataType::Unknown))
            .collect();
        let column_count = columns.len();

        consumer.start_table(TableMetaData::new(name, columns, self.policy))?;
        for (line_idx0, line) in lines.enumerate() {
            // 1-based row number for users; +1 again because the header is row 1.
            let user_row = line_idx0 + 2;
            let values = self.dialect.parse_values(line)?;
            if values.len() != column_count {
                return Err(FixtureError::structure(format!(
                    "row {user_row} of '{}' has {} fields, expected {column_count}",
                    path.display(),
                    values.len()
                )));
            }
            consumer.row(values)?;
        }
        consumer.end_table()
    }
}

impl DataSetProducer for FlatDirProducer {
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> FixtureResult<()> {
        let files = self.table_files()?;
        consumer.start_dataset()?;
        for (name, path) in &files {
            self.produce_table(name, path, consumer)?;
        }
        consumer.end_dataset()
    }
}

/// Load a dataset directory into memory.
pub fn load_flat_dir(
    dir: impl AsRef<Path>,
    dialect: FlatDialect,
    policy: CaseSensitivity,
) -> FixtureResult<DefaultDataSet> {
    let mut producer = FlatDirProducer::new(dir, dialect, policy);
    let mut builder = DataSetBuilder::new(policy);
    producer.produce(&mut builder)?;
    builder.into_dataset()
}
