//! Structured JSON dataset loading.
//!
//! A dataset is a top-level object mapping table names to arrays of row
//! objects:
//!
//! ```json
//! { "PERSON": [ {"ID": 1, "NAME": "Ada"}, {"ID": 2, "NAME": null} ] }
//! ```
//!
//! Table order and column order follow the file's declaration order (the
//! first row object fixes the column set). Columns carry
//! [`DataType::Unknown`]: like the flat format, the file does not declare SQL
//! types, so comparison adopts the live table's types.

use std::fs;
use std::path::Path;

use crate::dataset::column::{Column, DataType, Value};
use crate::dataset::map::CaseSensitivity;
use crate::dataset::metadata::TableMetaData;
use crate::dataset::stream::{DataSetBuilder, DataSetConsumer, DataSetProducer};
use crate::dataset::DefaultDataSet;
use crate::error::{FixtureError, FixtureResult};

/// Streams a parsed JSON document through the producer/consumer contract.
pub struct JsonProducer {
    document: serde_json::Value,
    policy: CaseSensitivity,
}

impl JsonProducer {
    /// Produce from JSON text.
    pub fn from_str(input: &str, policy: CaseSensitivity) -> FixtureResult<Self> {
        let document = serde_json::from_str(input)?;
        Ok(Self { document, policy })
    }

    fn produce_table(
        &self,
        name: &str,
        rows: &[serde_json::Value],
        consumer: &mut dyn DataSetConsumer,
    ) -> FixtureResult<()> {
        // The first row object fixes the column set; an empty array is a
        // table with no columns and no rows.
        let columns: Vec<Column> = match rows.first() {
            Some(first) => object_of(first, name, 1)?
                .keys()
                .map(|k| Column::new(k.as_str(), DataType::Unknown))
                .collect(),
            None => Vec::new(),
        };
        let names: Vec<String> = columns.iter().map(|c| c.name().to_owned()).collect();

        consumer.start_table(TableMetaData::new(name, columns, self.policy))?;
        for (idx0, row) in rows.iter().enumerate() {
            let row_num = idx0 + 1;
            let obj = object_of(row, name, row_num)?;
            let mut values = Vec::with_capacity(names.len());
            for column in &names {
                let jv = obj.get(column).ok_or_else(|| {
                    FixtureError::structure(format!(
                        "row {row_num} of table '{name}' missing field '{column}'"
                    ))
                })?;
                values.push(convert_json_value(jv, name, column, row_num)?);
            }
            if obj.len() != names.len() {
                return Err(FixtureError::structure(format!(
                    "row {row_num} of table '{name}' has fields not declared by row 1"
                )));
            }
            consumer.row(values)?;
        }
        consumer.end_table()
    }
}

impl DataSetProducer for JsonProducer {
    fn produce(&mut self, consumer: &mut dyn DataSetConsumer) -> FixtureResult<()> {
        let tables = self.document.as_object().ok_or_else(|| {
            FixtureError::structure("json dataset must be an object of table arrays")
        })?;

        consumer.start_dataset()?;
        for (name, rows) in tables {
            let rows = rows.as_array().ok_or_else(|| {
                FixtureError::structure(format!("table '{name}' must be an array of row objects"))
            })?;
            self.produce_table(name, rows, consumer)?;
        }
        consumer.end_dataset()
    }
}

fn object_of<'a>(
    v: &'a serde_json::Value,
    table: &str,
    row_num: usize,
) -> FixtureResult<&'a serde_json::Map<String, serde_json::Value>> {
    v.as_object().ok_or_else(|| {
        FixtureError::structure(format!(
            "row {row_num} of table '{table}' is not a json object"
        ))
    })
}

fn convert_json_value(
    v: &serde_json::Value,
    table: &str,
    column: &str,
    row_num: usize,
) -> FixtureResult<Value> {
    match v {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Double(f))
            } else {
                Err(FixtureError::structure(format!(
                    "row {row_num} column '{column}' of table '{table}': number {n} out of range"
                )))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
        _ => Err(FixtureError::structure(format!(
            "row {row_num} column '{column}' of table '{table}': nested values not supported"
        ))),
    }
}

/// Load a structured JSON dataset from text.
pub fn load_json_str(input: &str, policy: CaseSensitivity) -> FixtureResult<DefaultDataSet> {
    let mut producer = JsonProducer::from_str(input, policy)?;
    let mut builder = DataSetBuilder::new(policy);
    producer.produce(&mut builder)?;
    builder.into_dataset()
}

/// Load a structured JSON dataset from a file.
pub fn load_json_from_path(
    path: impl AsRef<Path>,
    policy: CaseSensitivity,
) -> FixtureResult<DefaultDataSet> {
    let text = fs::read_to_string(path)?;
    load_json_str(&text, policy)
}
