//! The delimited flat-record dialect, built on the handler pipeline.
//!
//! This is deliberately not RFC-4180: fields are left-trimmed, a quote opens
//! a scoped sub-grammar only at field start, the escape character works both
//! inside and outside quotes, and the unquoted literal `null` token reads as
//! SQL NULL.

use crate::dataset::column::Value;
use crate::error::{FixtureError, FixtureResult};
use crate::pipeline::{
    accept_all, end_piece_on, escape, ignore_leading_whitespace, quoted_field, Pipeline,
};

/// The literal token a flat file uses for SQL NULL.
pub const NULL_TOKEN: &str = "null";

/// Separator/quote/escape configuration for the flat dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatDialect {
    /// Field separator.
    pub separator: char,
    /// Quote character opening a scoped field at field start.
    pub quote: char,
    /// Escape character taking the next character literally.
    pub escape: char,
}

impl Default for FlatDialect {
    fn default() -> Self {
        Self {
            separator: ',',
            quote: '"',
            escape: '\\',
        }
    }
}

impl FlatDialect {
    /// Assemble the handler chain for this dialect.
    ///
    /// Registration order matters: accept-all first (rearmost fallback), then
    /// the separator, the escape, leading-whitespace trim, and the quote scope
    /// frontmost.
    pub fn pipeline(&self) -> Pipeline {
        let mut p = Pipeline::new();
        p.put_front(accept_all());
        p.put_front(end_piece_on(self.separator));
        p.put_front(escape(self.escape));
        p.put_front(ignore_leading_whitespace());
        p.put_front(quoted_field(self.quote, self.escape));
        p
    }

    /// Tokenize one record into its fields.
    ///
    /// Empty fields are preserved (consecutive separators produce empty
    /// strings). An unterminated quoted field is a pipeline-state fault.
    pub fn parse_record(&self, line: &str) -> FixtureResult<Vec<String>> {
        let mut pipeline = self.pipeline();
        pipeline.handle_all(line)?;
        if pipeline.scope_depth() > 0 {
            return Err(FixtureError::pipeline_state(format!(
                "unterminated quoted field in record '{line}'"
            )));
        }
        Ok(pipeline.finish())
    }

    /// Tokenize one record and read each field as a cell value: the
    /// [`NULL_TOKEN`] becomes [`Value::Null`], everything else text.
    pub fn parse_values(&self, line: &str) -> FixtureResult<Vec<Value>> {
        Ok(self
            .parse_record(line)?
            .into_iter()
            .map(|token| {
                if token == NULL_TOKEN {
                    Value::Null
                } else {
                    Value::Text(token)
                }
            })
            .collect())
    }
}
