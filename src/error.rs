use thiserror::Error;

use crate::assertion::ComparisonFailure;
use crate::dataset::column::DataType;

/// Convenience result type for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Error type returned across the crate.
///
/// This is a single error enum shared by the tokenizer pipeline, the dataset
/// model, loaders, comparison, and database operations.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a structured dataset file.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The tokenizer pipeline met a character no installed handler claims.
    #[error("no handler claims character '{character}' at position {position}")]
    IllegalCharacter { character: char, position: usize },

    /// Structural misuse of the handler pipeline (programming error).
    #[error("pipeline state: {message}")]
    PipelineState { message: String },

    /// A table lookup by name failed under the active case-sensitivity policy.
    #[error("no such table '{table}'")]
    NoSuchTable { table: String },

    /// A column lookup by name failed under the active case-sensitivity policy.
    #[error("no such column '{column}' in table '{table}'")]
    NoSuchColumn { table: String, column: String },

    /// A row index at or past the table's row count.
    #[error("row {row} out of bounds for table '{table}' with {row_count} rows")]
    RowOutOfBounds {
        row: usize,
        row_count: usize,
        table: String,
    },

    /// A value could not be coerced to a column's declared [`DataType`].
    #[error("cannot cast '{value}' to {data_type:?}: {message}")]
    TypeCast {
        value: String,
        data_type: DataType,
        message: String,
    },

    /// Dataset/table structure violation: producer/consumer nesting, duplicate
    /// table names, an empty column set where one is required, or a missing
    /// primary key.
    #[error("structure error: {message}")]
    Structure { message: String },

    /// Accumulated expected-vs-actual differences from a verification pass.
    #[error("{0}")]
    Verification(Box<ComparisonFailure>),

    /// Error surfaced by a [`crate::operation::StatementExecutor`] implementation.
    #[error("database error: {message}")]
    Database { message: String },
}

impl FixtureError {
    /// Shorthand for a [`FixtureError::Structure`] with a formatted message.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure {
            message: message.into(),
        }
    }

    /// Shorthand for a [`FixtureError::PipelineState`] with a formatted message.
    pub fn pipeline_state(message: impl Into<String>) -> Self {
        Self::PipelineState {
            message: message.into(),
        }
    }
}
