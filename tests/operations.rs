//! Bulk operation tests against an in-memory mock of the connection seam.
//!
//! The mock interprets the small SQL subset the operations emit (INSERT /
//! UPDATE / DELETE / TRUNCATE over literal values) so round-trip properties
//! can be checked end to end without a driver.

use dbfixture::assertion::assert_datasets_equal;
use dbfixture::dataset::{
    CaseSensitivity, Column, DataSet, DataType, DefaultDataSet, DefaultTable, Table,
    TableMetaData, Value,
};
use dbfixture::operation::{
    run_cycle, DatabaseConfig, DatabaseConnection, Operation, OperationListener,
    StatementExecutor,
};
use dbfixture::{FixtureError, FixtureResult};

struct MockTable {
    meta: TableMetaData,
    rows: Vec<Vec<Value>>,
}

struct MockDb {
    config: DatabaseConfig,
    tables: Vec<MockTable>,
    log: Vec<String>,
    fail_close: bool,
    closed: bool,
}

impl MockDb {
    fn new(tables: Vec<TableMetaData>) -> Self {
        Self {
            config: DatabaseConfig::default(),
            tables: tables
                .into_iter()
                .map(|meta| MockTable {
                    meta,
                    rows: Vec::new(),
                })
                .collect(),
            log: Vec::new(),
            fail_close: false,
            closed: false,
        }
    }

    fn table_mut(&mut self, name: &str) -> FixtureResult<&mut MockTable> {
        self.tables
            .iter_mut()
            .find(|t| {
                CaseSensitivity::Insensitive.matches(t.meta.table_name(), name)
            })
            .ok_or_else(|| FixtureError::Database {
                message: format!("unknown table '{name}'"),
            })
    }
}

fn parse_literal(s: &str) -> Value {
    let s = s.trim();
    if s == "NULL" {
        Value::Null
    } else if s == "TRUE" {
        Value::Boolean(true)
    } else if s == "FALSE" {
        Value::Boolean(false)
    } else if let Some(inner) = s.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        Value::Text(inner.replace("''", "'"))
    } else if s.contains('.') {
        Value::Double(s.parse().expect("double literal"))
    } else {
        Value::Integer(s.parse().expect("integer literal"))
    }
}

/// Parse `COL = literal [AND COL = literal ...]` into (column, value) pairs.
fn parse_clause(clause: &str) -> Vec<(String, Value)> {
    clause
        .split(" AND ")
        .map(|term| {
            let (col, lit) = term.split_once('=').expect("clause term");
            (col.trim().to_owned(), parse_literal(lit))
        })
        .collect()
}

impl StatementExecutor for MockDb {
    fn execute(&mut self, sql: &str) -> FixtureResult<usize> {
        self.log.push(sql.to_owned());

        if let Some(rest) = sql.strip_prefix("INSERT INTO ") {
            let (name, rest) = rest.split_once(" (").expect("insert columns");
            let (cols, rest) = rest.split_once(") VALUES (").expect("insert values");
            let vals = rest.strip_suffix(')').expect("insert close paren");
            let columns: Vec<&str> = cols.split(", ").collect();
            let values: Vec<Value> = vals.split(", ").map(parse_literal).collect();

            let table = self.table_mut(name)?;
            let mut row = Vec::with_capacity(table.meta.columns().len());
            for col in table.meta.columns() {
                let value = columns
                    .iter()
                    .position(|c| col.name_matches(c, CaseSensitivity::Insensitive))
                    .map(|i| values[i].clone())
                    .unwrap_or(Value::Null);
                row.push(col.data_type().coerce(&value)?);
            }
            table.rows.push(row);
            Ok(1)
        } else if let Some(rest) = sql.strip_prefix("UPDATE ") {
            let (name, rest) = rest.split_once(" SET ").expect("update set");
            let (assignments, clause) = rest.split_once(" WHERE ").expect("update where");
            let sets = parse_clause(&assignments.replace(", ", " AND "));
            let conditions = parse_clause(clause);

            let table = self.table_mut(name)?;
            let meta = table.meta.clone();
            let mut affected = 0;
            for row in &mut table.rows {
                if row_matches_meta(&meta, row, &conditions) {
                    for (col, value) in &sets {
                        let idx = meta.column_index(col)?;
                        row[idx] = meta.columns()[idx].data_type().coerce(value)?;
                    }
                    affected += 1;
                }
            }
            Ok(affected)
        } else if let Some(rest) = sql.strip_prefix("DELETE FROM ") {
            match rest.split_once(" WHERE ") {
                Some((name, clause)) => {
                    let conditions = parse_clause(clause);
                    let table = self.table_mut(name)?;
                    let meta = table.meta.clone();
                    let before = table.rows.len();
                    table
                        .rows
                        .retain(|row| !row_matches_meta(&meta, row, &conditions));
                    Ok(before - table.rows.len())
                }
                None => {
                    let table = self.table_mut(rest)?;
                    let removed = table.rows.len();
                    table.rows.clear();
                    Ok(removed)
                }
            }
        } else if let Some(name) = sql.strip_prefix("TRUNCATE TABLE ") {
            let table = self.table_mut(name)?;
            let removed = table.rows.len();
            table.rows.clear();
            Ok(removed)
        } else {
            Err(FixtureError::Database {
                message: format!("unsupported statement: {sql}"),
            })
        }
    }
}

fn row_matches_meta(meta: &TableMetaData, row: &[Value], conditions: &[(String, Value)]) -> bool {
    conditions.iter().all(|(col, want)| {
        let idx = meta.column_index(col).expect("condition column");
        let ty = meta.columns()[idx].data_type();
        ty.coerce(want).expect("condition literal") == row[idx]
    })
}

impl DatabaseConnection for MockDb {
    fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    fn create_dataset(&mut self) -> FixtureResult<DefaultDataSet> {
        let mut ds = DefaultDataSet::new(CaseSensitivity::Insensitive);
        for table in &self.tables {
            let mut t = DefaultTable::new(table.meta.clone());
            for row in &table.rows {
                t.add_row(row.clone())?;
            }
            ds.add_table(t)?;
        }
        Ok(ds)
    }

    fn executor(&mut self) -> &mut dyn StatementExecutor {
        self
    }

    fn close(&mut self) -> FixtureResult<()> {
        self.closed = true;
        if self.fail_close {
            return Err(FixtureError::Database {
                message: "close failed".to_string(),
            });
        }
        Ok(())
    }
}

fn live_schema() -> Vec<TableMetaData> {
    vec![
        TableMetaData::new(
            "X",
            vec![
                Column::new("ID", DataType::Integer),
                Column::new("NAME", DataType::Varchar),
            ],
            CaseSensitivity::Insensitive,
        )
        .with_primary_keys(&["ID"])
        .unwrap(),
        TableMetaData::new(
            "Y",
            vec![
                Column::new("ID", DataType::Integer),
                Column::new("X_ID", DataType::Integer),
            ],
            CaseSensitivity::Insensitive,
        )
        .with_primary_keys(&["ID"])
        .unwrap(),
    ]
}

fn untyped_meta(name: &str, columns: &[&str], keys: &[&str]) -> TableMetaData {
    TableMetaData::new(
        name,
        columns
            .iter()
            .map(|c| Column::new(*c, DataType::Unknown))
            .collect(),
        CaseSensitivity::Insensitive,
    )
    .with_primary_keys(keys)
    .unwrap()
}

fn source_dataset() -> DefaultDataSet {
    let mut ds = DefaultDataSet::new(CaseSensitivity::Insensitive);

    let mut x = DefaultTable::new(untyped_meta("X", &["ID", "NAME"], &["ID"]));
    x.add_row(vec![Value::Text("1".to_string()), Value::Text("Ada".to_string())])
        .unwrap();
    x.add_row(vec![
        Value::Text("2".to_string()),
        Value::Text("Grace".to_string()),
    ])
    .unwrap();
    ds.add_table(x).unwrap();

    let mut y = DefaultTable::new(untyped_meta("Y", &["ID", "X_ID"], &["ID"]));
    y.add_row(vec![Value::Text("10".to_string()), Value::Text("1".to_string())])
        .unwrap();
    ds.add_table(y).unwrap();

    ds
}

#[test]
fn clean_insert_deletes_reversed_then_inserts_declared_order() {
    let mut db = MockDb::new(live_schema());
    let source = source_dataset();

    Operation::CleanInsert.execute(&source, &mut db).unwrap();

    assert_eq!(
        db.log,
        vec![
            "DELETE FROM Y",
            "DELETE FROM X",
            "INSERT INTO X (ID, NAME) VALUES ('1', 'Ada')",
            "INSERT INTO X (ID, NAME) VALUES ('2', 'Grace')",
            "INSERT INTO Y (ID, X_ID) VALUES ('10', '1')",
        ]
    );

    // A fresh scan of the live schema equals the source dataset.
    let actual = db.create_dataset().unwrap();
    assert_datasets_equal(&source, &actual).unwrap();
}

#[test]
fn clean_insert_is_idempotent() {
    let mut db = MockDb::new(live_schema());
    let source = source_dataset();

    Operation::CleanInsert.execute(&source, &mut db).unwrap();
    Operation::CleanInsert.execute(&source, &mut db).unwrap();

    let actual = db.create_dataset().unwrap();
    assert_datasets_equal(&source, &actual).unwrap();
}

#[test]
fn refresh_updates_present_rows_and_inserts_missing_ones() {
    let mut db = MockDb::new(live_schema());
    db.execute("INSERT INTO X (ID, NAME) VALUES (1, 'Old')").unwrap();
    db.log.clear();

    let mut ds = DefaultDataSet::new(CaseSensitivity::Insensitive);
    let mut x = DefaultTable::new(untyped_meta("X", &["ID", "NAME"], &["ID"]));
    x.add_row(vec![Value::Text("1".to_string()), Value::Text("Ada".to_string())])
        .unwrap();
    x.add_row(vec![
        Value::Text("2".to_string()),
        Value::Text("Grace".to_string()),
    ])
    .unwrap();
    ds.add_table(x).unwrap();

    Operation::Refresh.execute(&ds, &mut db).unwrap();

    assert_eq!(
        db.log,
        vec![
            "UPDATE X SET NAME = 'Ada' WHERE ID = '1'",
            "UPDATE X SET NAME = 'Grace' WHERE ID = '2'",
            "INSERT INTO X (ID, NAME) VALUES ('2', 'Grace')",
        ]
    );
    let actual = db.create_dataset().unwrap();
    let x = actual.table("X").unwrap();
    assert_eq!(x.row_count(), 2);
    assert_eq!(x.value(0, "NAME").unwrap(), Value::Text("Ada".to_string()));
    assert_eq!(x.value(1, "NAME").unwrap(), Value::Text("Grace".to_string()));
}

#[test]
fn delete_removes_by_primary_key_reversed() {
    let mut db = MockDb::new(live_schema());
    db.execute("INSERT INTO X (ID, NAME) VALUES (1, 'Ada')").unwrap();
    db.execute("INSERT INTO Y (ID, X_ID) VALUES (10, 1)").unwrap();
    db.log.clear();

    Operation::Delete.execute(&source_dataset(), &mut db).unwrap();

    assert_eq!(
        db.log,
        vec![
            "DELETE FROM Y WHERE ID = '10'",
            "DELETE FROM X WHERE ID = '2'",
            "DELETE FROM X WHERE ID = '1'",
        ]
    );
    let actual = db.create_dataset().unwrap();
    assert_eq!(actual.table("X").unwrap().row_count(), 0);
    assert_eq!(actual.table("Y").unwrap().row_count(), 0);
}

#[test]
fn update_without_primary_key_is_structure_fault() {
    let mut db = MockDb::new(live_schema());
    let mut ds = DefaultDataSet::new(CaseSensitivity::Insensitive);
    let mut x = DefaultTable::new(untyped_meta("X", &["ID", "NAME"], &[]));
    x.add_row(vec![Value::Text("1".to_string()), Value::Text("Ada".to_string())])
        .unwrap();
    ds.add_table(x).unwrap();

    let err = Operation::Update.execute(&ds, &mut db).unwrap_err();
    assert!(err.to_string().contains("no primary key"));
}

#[test]
fn truncate_processes_tables_reversed() {
    let mut db = MockDb::new(live_schema());
    Operation::Truncate.execute(&source_dataset(), &mut db).unwrap();
    assert_eq!(db.log, vec!["TRUNCATE TABLE Y", "TRUNCATE TABLE X"]);
}

#[test]
fn run_cycle_closes_on_success() {
    let mut db = MockDb::new(live_schema());
    run_cycle(&mut db, None, |conn| {
        Operation::CleanInsert.execute(&source_dataset(), conn)
    })
    .unwrap();
    assert!(db.closed);
}

#[test]
fn cleanup_fault_shadows_body_fault_and_reports_it_to_the_listener() {
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        shadowed: Mutex<Vec<String>>,
    }
    impl OperationListener for Recording {
        fn on_shadowed_fault(&self, fault: &FixtureError) {
            self.shadowed.lock().unwrap().push(fault.to_string());
        }
    }

    let mut db = MockDb::new(live_schema());
    db.fail_close = true;
    let listener = Recording::default();

    let err = run_cycle(&mut db, Some(&listener), |_conn| {
        Err::<(), _>(FixtureError::structure("body failed"))
    })
    .unwrap_err();

    // The cleanup fault is the reported one; the body fault went to the
    // listener instead of vanishing.
    assert!(err.to_string().contains("close failed"));
    let shadowed = listener.shadowed.lock().unwrap();
    assert_eq!(shadowed.len(), 1);
    assert!(shadowed[0].contains("body failed"));
}
