//! Table metadata: ordered columns plus a primary-key subset.

use crate::dataset::column::Column;
use crate::dataset::map::CaseSensitivity;
use crate::error::{FixtureError, FixtureResult};

/// Ordered column list for one table, with an optional primary-key subset.
///
/// Column insertion order is significant: it determines default comparison and
/// output order. Primary-key columns must be a subset of the declared columns,
/// resolved by name under the same case-sensitivity policy as the owning
/// dataset. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetaData {
    table_name: String,
    columns: Vec<Column>,
    primary_keys: Vec<usize>,
    policy: CaseSensitivity,
}

impl TableMetaData {
    /// Create metadata with no primary keys.
    pub fn new(
        table_name: impl Into<String>,
        columns: Vec<Column>,
        policy: CaseSensitivity,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            primary_keys: Vec::new(),
            policy,
        }
    }

    /// Declare the primary-key columns by name.
    ///
    /// Each name must resolve to a declared column under the policy, else this
    /// is a [`FixtureError::NoSuchColumn`].
    pub fn with_primary_keys(mut self, names: &[&str]) -> FixtureResult<Self> {
        let mut keys = Vec::with_capacity(names.len());
        for name in names {
            keys.push(self.column_index(name)?);
        }
        self.primary_keys = keys;
        Ok(self)
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Declared columns in insertion order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The case-sensitivity policy names resolve under.
    pub fn policy(&self) -> CaseSensitivity {
        self.policy
    }

    /// Primary-key columns, in declaration order of the key.
    pub fn primary_key_columns(&self) -> impl Iterator<Item = &Column> {
        self.primary_keys.iter().map(|&i| &self.columns[i])
    }

    /// Whether any primary key is declared.
    pub fn has_primary_keys(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    /// Position of `name` among the columns, under the policy.
    pub fn column_index(&self, name: &str) -> FixtureResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name_matches(name, self.policy))
            .ok_or_else(|| FixtureError::NoSuchColumn {
                table: self.table_name.clone(),
                column: name.to_owned(),
            })
    }

    /// Look up a column by name, under the policy.
    pub fn column(&self, name: &str) -> FixtureResult<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Whether `name` resolves to a declared column.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.name_matches(name, self.policy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::column::DataType;

    fn meta() -> TableMetaData {
        TableMetaData::new(
            "PERSON",
            vec![
                Column::new("ID", DataType::Integer),
                Column::new("NAME", DataType::Varchar),
            ],
            CaseSensitivity::Insensitive,
        )
    }

    #[test]
    fn column_lookup_respects_policy() {
        let m = meta();
        assert_eq!(m.column_index("id").unwrap(), 0);
        let err = m.column_index("missing").unwrap_err();
        assert!(err.to_string().contains("no such column 'missing'"));
    }

    #[test]
    fn primary_keys_must_be_declared_columns() {
        let m = meta().with_primary_keys(&["id"]).unwrap();
        let keys: Vec<_> = m.primary_key_columns().map(|c| c.name()).collect();
        assert_eq!(keys, vec!["ID"]);

        let err = meta().with_primary_keys(&["nope"]).unwrap_err();
        assert!(err.to_string().contains("no such column"));
    }
}
