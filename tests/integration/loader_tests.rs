//! Integration tests for loading datasets through DuckDB

use crate::common::{sample_data, TestFixture};
use serde_json::json;
use tabcompare::loader::{DatasetLoader, SourceDescriptor};
use tabcompare::{DataType, TabcompareError, Value};

#[test]
fn test_load_csv() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture.create_csv("base.csv", &sample_data::base_csv_data()).unwrap();

    let dataset = DatasetLoader::new().unwrap().load_path(&path).unwrap();

    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.column_names(), vec!["id", "name", "price"]);
    assert_eq!(dataset.columns()[0].data_type, DataType::Integer);
    assert_eq!(dataset.columns()[1].data_type, DataType::String);
    assert_eq!(dataset.columns()[2].data_type, DataType::Float);
    assert_eq!(dataset.rows()[1][1], Value::from("Banana"));
    assert_eq!(dataset.rows()[2][2], Value::Float(2.0));
}

#[test]
fn test_load_tsv() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("base.tsv", "id\tlabel\n1\tone\n2\ttwo\n")
        .unwrap();

    let dataset = DatasetLoader::new().unwrap().load_path(&path).unwrap();

    assert_eq!(dataset.column_names(), vec!["id", "label"]);
    assert_eq!(dataset.rows()[1], vec![Value::Integer(2), Value::from("two")]);
}

#[test]
fn test_load_json_array() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_json(
            "base.json",
            &json!([
                {"id": 1, "name": "Apple", "ok": true},
                {"id": 2, "name": "Banana", "ok": false}
            ]),
        )
        .unwrap();

    let dataset = DatasetLoader::new().unwrap().load_path(&path).unwrap();

    assert_eq!(dataset.row_count(), 2);
    let ok = dataset.column_index("ok").unwrap();
    assert_eq!(dataset.columns()[ok].data_type, DataType::Boolean);
    assert_eq!(dataset.rows()[1][ok], Value::Boolean(false));
}

#[test]
fn test_empty_cells_load_as_null() {
    let fixture = TestFixture::new().unwrap();
    let path = fixture
        .create_csv_raw("nulls.csv", "id,score\n1,\n2,3.5\n")
        .unwrap();

    let dataset = DatasetLoader::new().unwrap().load_path(&path).unwrap();

    assert_eq!(dataset.rows()[0][1], Value::Null);
    assert_eq!(dataset.null_count(1), 1);
    assert!(dataset.columns()[1].nullable);
}

#[test]
fn test_load_sql_source() {
    let fixture = TestFixture::new().unwrap();
    let csv = fixture.create_csv("base.csv", &sample_data::base_csv_data()).unwrap();
    let sql = format!(
        "SELECT id, upper(name) AS name FROM read_csv_auto('{}') WHERE id > 1 ORDER BY id;",
        csv.display()
    );
    let sql_path = fixture.create_csv_raw("query.sql", &sql).unwrap();

    let source = SourceDescriptor::from_path(&sql_path).unwrap();
    assert!(matches!(source, SourceDescriptor::Sql(_)));

    let dataset = DatasetLoader::new().unwrap().load(&source).unwrap();
    assert_eq!(dataset.row_count(), 2);
    assert_eq!(dataset.rows()[0][1], Value::from("BANANA"));
}

#[test]
fn test_missing_and_unsupported_inputs() {
    let fixture = TestFixture::new().unwrap();

    let missing = fixture.root().join("missing.csv");
    assert!(matches!(
        SourceDescriptor::from_path(&missing),
        Err(TabcompareError::InvalidInput { .. })
    ));

    let unsupported = fixture.create_csv_raw("data.xlsx", "binary").unwrap();
    assert!(SourceDescriptor::from_path(&unsupported).is_err());
}
