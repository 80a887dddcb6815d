use dbfixture::dataset::{DataSet, DataType, Table, Value};
use dbfixture::ingestion::{load_flat_dir, FlatDialect};
use dbfixture::dataset::CaseSensitivity;

#[test]
fn loads_tables_in_control_file_order() {
    let ds = load_flat_dir(
        "tests/fixtures/prep",
        FlatDialect::default(),
        CaseSensitivity::Insensitive,
    )
    .unwrap();
    assert_eq!(ds.table_names(), vec!["PERSON", "ADDRESS"]);
}

#[test]
fn flat_columns_are_untyped_and_values_are_text() {
    let ds = load_flat_dir(
        "tests/fixtures/prep",
        FlatDialect::default(),
        CaseSensitivity::Insensitive,
    )
    .unwrap();
    let person = ds.table("person").unwrap();
    assert!(person
        .metadata()
        .columns()
        .iter()
        .all(|c| c.data_type() == DataType::Unknown));
    assert_eq!(person.value(0, "ID").unwrap(), Value::Text("1".to_string()));
}

#[test]
fn quoted_field_and_null_token_in_table_files() {
    let ds = load_flat_dir(
        "tests/fixtures/prep",
        FlatDialect::default(),
        CaseSensitivity::Insensitive,
    )
    .unwrap();
    let person = ds.table("PERSON").unwrap();
    assert_eq!(
        person.value(1, "NAME").unwrap(),
        Value::Text("Lovelace, Ada".to_string())
    );
    assert_eq!(person.value(2, "NAME").unwrap(), Value::Null);
}

#[test]
fn without_control_file_tables_load_in_lexical_order() {
    let ds = load_flat_dir(
        "tests/fixtures/unordered",
        FlatDialect::default(),
        CaseSensitivity::Insensitive,
    )
    .unwrap();
    assert_eq!(ds.table_names(), vec!["A", "B"]);
}

#[test]
fn ragged_row_is_a_structure_error_with_row_number() {
    let dir = std::env::temp_dir().join(format!(
        "dbfixture-flat-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("BAD.csv"), "A, B\n1, 2\n3\n").unwrap();

    let err = load_flat_dir(&dir, FlatDialect::default(), CaseSensitivity::Insensitive)
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("row 3"), "message was: {msg}");
    assert!(msg.contains("expected 2"), "message was: {msg}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_listed_table_file_is_io_error() {
    let dir = std::env::temp_dir().join(format!(
        "dbfixture-missing-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("table-ordering.txt"), "GHOST\n").unwrap();

    let err = load_flat_dir(&dir, FlatDialect::default(), CaseSensitivity::Insensitive)
        .unwrap_err();
    assert!(err.to_string().contains("io error"));

    let _ = std::fs::remove_dir_all(&dir);
}
