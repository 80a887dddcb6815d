//! `dbfixture` is a support library for database tests: it loads tabular
//! datasets from external representations, compares them against live table
//! contents, and applies idempotent bulk mutations to bring a database to a
//! known state before and after a test.
//!
//! ## The model
//!
//! A [`dataset::DataSet`] is an ordered collection of named
//! [`dataset::Table`]s; each table owns a [`dataset::TableMetaData`] (ordered,
//! typed columns plus a primary-key subset) and answers
//! `value(row, column_name)` lookups. Name matching, for tables and columns
//! alike, runs under a [`dataset::CaseSensitivity`] policy fixed at
//! construction.
//! Decorators re-order rows ([`dataset::SortedTable`]), restrict columns
//! ([`dataset::IncludedColumnsTable`] / [`dataset::ExcludedColumnsTable`]),
//! merge sources ([`dataset::CompositeDataSet`]), or substitute tokens
//! ([`dataset::ReplacementDataSet`]) without mutating what they wrap.
//!
//! ## Loading
//!
//! Flat files are tokenized by the [`pipeline`] module: an ordered chain of
//! per-character handlers assembled per dialect, with quoted fields and
//! escapes handled as scoped sub-grammars. [`ingestion::load_from_path`]
//! auto-detects the source format (dataset directory vs. structured JSON) and
//! returns the loaded dataset.
//!
//! ```no_run
//! use dbfixture::ingestion::{load_from_path, LoadOptions};
//!
//! # fn main() -> Result<(), dbfixture::FixtureError> {
//! let prep = load_from_path("fixtures/prep", &LoadOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Verifying
//!
//! [`assertion::Comparison`] enumerates common rows and accumulates every
//! mismatch into one aggregated verification fault, substituting the live
//! table's datatypes when the expected side is untyped:
//!
//! ```no_run
//! use dbfixture::assertion::assert_datasets_equal;
//! use dbfixture::ingestion::{load_from_path, LoadOptions};
//! # fn scan_live_schema() -> dbfixture::dataset::DefaultDataSet { unimplemented!() }
//!
//! # fn main() -> Result<(), dbfixture::FixtureError> {
//! let expected = load_from_path("fixtures/expected", &LoadOptions::default())?;
//! let actual = scan_live_schema();
//! assert_datasets_equal(&expected, &actual)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Mutating
//!
//! [`operation::Operation`] strategies (INSERT, REFRESH, DELETE_ALL,
//! CLEAN_INSERT, ...) assemble SQL from the table model and run it through
//! the [`operation::DatabaseConnection`] seam; [`operation::run_cycle`]
//! scopes a connection to one cycle and closes it on every exit path.
//!
//! ## Modules
//!
//! - [`pipeline`]: the character-classification tokenizer
//! - [`dataset`]: columns, metadata, tables, datasets, decorators
//! - [`ingestion`]: flat-directory and JSON loaders, unified entrypoint
//! - [`assertion`]: expected-vs-actual comparison
//! - [`operation`]: bulk mutation strategies and the connection seam
//! - [`error`]: the crate-wide error enum

pub mod assertion;
pub mod dataset;
pub mod error;
pub mod ingestion;
pub mod operation;
pub mod pipeline;

pub use error::{FixtureError, FixtureResult};
