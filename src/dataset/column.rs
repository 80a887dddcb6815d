//! Columns, datatypes, and cell values.
//!
//! [`DataType`] is a closed catalog of SQL-like types plus [`DataType::Unknown`]
//! for sources (flat files) that cannot express types natively. Coercion
//! happens at read/write boundaries, never in storage.

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::dataset::map::CaseSensitivity;
use crate::error::{FixtureError, FixtureResult};

/// Logical datatype for a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    /// Type not declared by the source; values pass through uncoerced.
    Unknown,
    /// Boolean.
    Boolean,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Double,
    /// UTF-8 string.
    Varchar,
    /// Calendar date.
    Date,
    /// Date and time of day.
    Timestamp,
}

/// A single typed cell value; [`Value::Null`] represents SQL NULL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time of day.
    Timestamp(NaiveDateTime),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Integer(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v}"),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl DataType {
    /// Coerce `value` into this datatype's canonical [`Value`] form.
    ///
    /// `Null` passes through every type; `Unknown` passes everything through
    /// untouched. Failure is a [`FixtureError::TypeCast`] carrying the
    /// offending value and the target type.
    pub fn coerce(&self, value: &Value) -> FixtureResult<Value> {
        if matches!(value, Value::Null) || matches!(self, DataType::Unknown) {
            return Ok(value.clone());
        }

        match self {
            DataType::Unknown => unreachable!("handled above"),
            DataType::Varchar => Ok(Value::Text(value.to_string())),
            DataType::Boolean => match value {
                Value::Boolean(v) => Ok(Value::Boolean(*v)),
                Value::Integer(0) => Ok(Value::Boolean(false)),
                Value::Integer(1) => Ok(Value::Boolean(true)),
                Value::Text(s) => parse_bool(s)
                    .map(Value::Boolean)
                    .map_err(|message| self.cast_error(value, message)),
                _ => Err(self.cast_error(value, "expected bool".to_string())),
            },
            DataType::Integer => match value {
                Value::Integer(v) => Ok(Value::Integer(*v)),
                Value::Boolean(v) => Ok(Value::Integer(i64::from(*v))),
                Value::Double(v) if v.fract() == 0.0 => Ok(Value::Integer(*v as i64)),
                Value::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(Value::Integer)
                    .map_err(|e| self.cast_error(value, e.to_string())),
                _ => Err(self.cast_error(value, "expected integer number".to_string())),
            },
            DataType::Double => match value {
                Value::Double(v) => Ok(Value::Double(*v)),
                Value::Integer(v) => Ok(Value::Double(*v as f64)),
                Value::Text(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|e| self.cast_error(value, e.to_string())),
                _ => Err(self.cast_error(value, "expected number".to_string())),
            },
            DataType::Date => match value {
                Value::Date(v) => Ok(Value::Date(*v)),
                Value::Timestamp(v) => Ok(Value::Date(v.date())),
                Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|e| self.cast_error(value, e.to_string())),
                _ => Err(self.cast_error(value, "expected date".to_string())),
            },
            DataType::Timestamp => match value {
                Value::Timestamp(v) => Ok(Value::Timestamp(*v)),
                Value::Date(v) => Ok(Value::Timestamp(v.and_time(chrono::NaiveTime::MIN))),
                Value::Text(s) => parse_timestamp(s.trim())
                    .map(Value::Timestamp)
                    .map_err(|message| self.cast_error(value, message)),
                _ => Err(self.cast_error(value, "expected timestamp".to_string())),
            },
        }
    }

    fn cast_error(&self, value: &Value, message: String) -> FixtureError {
        FixtureError::TypeCast {
            value: value.to_string(),
            data_type: *self,
            message,
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| e.to_string())
}

/// Compare two cell values for row ordering.
///
/// With `use_comparable`, values of the same kind order naturally (numbers
/// numerically, dates chronologically); mixed numeric kinds compare as
/// doubles. Otherwise, and for any remaining mixed pair, the rendered string
/// forms are compared. `Null` sorts before everything.
pub fn compare_values(a: &Value, b: &Value, use_comparable: bool) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ if use_comparable => match (a, b) {
            (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
            (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
            (Value::Double(x), Value::Double(y)) => x.total_cmp(y),
            (Value::Integer(x), Value::Double(y)) => (*x as f64).total_cmp(y),
            (Value::Double(x), Value::Integer(y)) => x.total_cmp(&(*y as f64)),
            (Value::Date(x), Value::Date(y)) => x.cmp(y),
            (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
            (Value::Text(x), Value::Text(y)) => x.cmp(y),
            _ => a.to_string().cmp(&b.to_string()),
        },
        _ => a.to_string().cmp(&b.to_string()),
    }
}

/// Whether a column may hold NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nullable {
    /// Column accepts NULL.
    Yes,
    /// Column rejects NULL.
    No,
    /// Source did not declare nullability.
    #[default]
    Unknown,
}

/// A single named, typed column in a [`crate::dataset::TableMetaData`].
///
/// Identity is the name: two columns refer to the same thing iff their names
/// match under the owning dataset's case-sensitivity policy (see
/// [`Column::name_matches`]). Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    data_type: DataType,
    nullable: Nullable,
}

impl Column {
    /// Create a column with undeclared nullability.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: Nullable::Unknown,
        }
    }

    /// Set the nullability flag.
    pub fn with_nullable(mut self, nullable: Nullable) -> Self {
        self.nullable = nullable;
        self
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared datatype.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Declared nullability.
    pub fn nullable(&self) -> Nullable {
        self.nullable
    }

    /// Whether this column's name matches `name` under `policy`.
    pub fn name_matches(&self, name: &str, policy: CaseSensitivity) -> bool {
        policy.matches(&self.name, name)
    }
}
