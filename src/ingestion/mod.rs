//! Dataset loading entrypoints and format implementations.
//!
//! Most callers should use [`load_from_path`], which:
//!
//! - auto-detects the format from the path shape (directory → flat dataset
//!   directory, `.json` file → structured JSON), or uses an explicit override
//! - loads into an in-memory dataset and wraps it for null-token substitution
//! - optionally reports success/failure/alerts to a [`LoadObserver`]
//!
//! Format-specific producers are also available under [`flat`] / [`csvdir`] /
//! [`json`]; they feed any [`crate::dataset::stream::DataSetConsumer`].

pub mod csvdir;
pub mod flat;
pub mod json;
pub mod observability;

pub use csvdir::{load_flat_dir, FlatDirProducer, TABLE_ORDERING_FILE};
pub use flat::{FlatDialect, NULL_TOKEN};
pub use json::{load_json_from_path, load_json_str, JsonProducer};
pub use observability::{
    CompositeObserver, FileObserver, LoadContext, LoadObserver, LoadSeverity, LoadStats,
    StdErrObserver,
};

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::dataset::map::CaseSensitivity;
use crate::dataset::replacement::ReplacementDataSet;
use crate::dataset::{DataSet, DefaultDataSet, Table};
use crate::error::{FixtureError, FixtureResult};

/// Supported dataset source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    /// A directory of delimited table files plus an optional ordering file.
    FlatDir,
    /// A structured JSON document of table arrays.
    Json,
}

impl FixtureFormat {
    /// Infer the format from a path: directories are flat dataset
    /// directories, `.json` files are structured JSON.
    pub fn from_path(path: &Path) -> Option<Self> {
        if path.is_dir() {
            return Some(Self::FlatDir);
        }
        match path.extension().and_then(|s| s.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options controlling unified dataset loading.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// If `None`, auto-detect the format from the path shape.
    pub format: Option<FixtureFormat>,
    /// Name-matching policy for the loaded dataset and its tables.
    pub case_sensitivity: CaseSensitivity,
    /// Separator/quote/escape configuration for flat sources.
    pub dialect: FlatDialect,
    /// Token substituted with SQL NULL as cells are read (in addition to the
    /// flat dialect's own unquoted `null` literal).
    pub null_token: Option<String>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn LoadObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: LoadSeverity,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("format", &self.format)
            .field("case_sensitivity", &self.case_sensitivity)
            .field("dialect", &self.dialect)
            .field("null_token", &self.null_token)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: None,
            case_sensitivity: CaseSensitivity::Insensitive,
            dialect: FlatDialect::default(),
            null_token: None,
            observer: None,
            alert_at_or_above: LoadSeverity::Critical,
        }
    }
}

/// Unified dataset loading entry point for path-based sources.
///
/// The result is the loaded dataset wrapped for token substitution; with no
/// `null_token` configured the wrapper substitutes nothing. When an observer
/// is configured, this function reports `on_success` with table/row stats,
/// `on_failure` with a computed severity, and `on_alert` when that severity
/// meets `options.alert_at_or_above`.
pub fn load_from_path(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> FixtureResult<ReplacementDataSet<DefaultDataSet>> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => FixtureFormat::from_path(path).ok_or_else(|| {
            FixtureError::structure(format!(
                "cannot infer fixture format for path ({})",
                path.display()
            ))
        })?,
    };

    let ctx = LoadContext {
        path: path.to_path_buf(),
        format,
    };

    let result = match format {
        FixtureFormat::FlatDir => {
            load_flat_dir(path, options.dialect, options.case_sensitivity)
        }
        FixtureFormat::Json => json::load_json_from_path(path, options.case_sensitivity),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(ds) => obs.on_success(&ctx, stats_of(ds)),
            Err(e) => {
                let severity = severity_for_error(e);
                obs.on_failure(&ctx, severity, e);
                if severity >= options.alert_at_or_above {
                    obs.on_alert(&ctx, severity, e);
                }
            }
        }
    }

    let mut wrapped = ReplacementDataSet::new(result?);
    if let Some(token) = &options.null_token {
        wrapped = wrapped.with_null_token(token.clone());
    }
    Ok(wrapped)
}

fn stats_of(ds: &DefaultDataSet) -> LoadStats {
    let names = ds.table_names();
    let rows = names
        .iter()
        .filter_map(|n| ds.get_table(n))
        .map(|t| t.row_count())
        .sum();
    LoadStats {
        tables: names.len(),
        rows,
    }
}

fn severity_for_error(e: &FixtureError) -> LoadSeverity {
    match e {
        // The fixture source itself is unreachable: the test cannot even run.
        FixtureError::Io(_) => LoadSeverity::Critical,
        _ => LoadSeverity::Error,
    }
}

/// Convenience for callers that want an owned, replayable load request.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Path to the dataset source.
    pub path: PathBuf,
    /// Options controlling the load.
    pub options: LoadOptions,
}

impl LoadRequest {
    /// Execute the request by calling [`load_from_path`].
    pub fn run(&self) -> FixtureResult<ReplacementDataSet<DefaultDataSet>> {
        load_from_path(&self.path, &self.options)
    }
}
