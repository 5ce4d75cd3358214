//! Parsing pipeline files from disk

use pretty_assertions::assert_eq;
use std::path::Path;
use tagflow_core::DiagnosticCode;
use tagflow_markup::{parse_file, ElementKind, Pipeline, TagParseError, UnitType};

const DAILY: &str = r#"
<task id="daily" type="python" schedule="0 6 * * *" active="true" steps="extract,load" force_build="no">
    run daily load
</task>

<connection id="warehouse" host="db.internal" port="5432" username="etl" password="hunter2"></connection>

<sql id="raw_orders" table="orders" schema="raw" connection="warehouse" materialization="incremental" primary_key="order_id">
    select * from source.orders
</sql>

<python id="enrich" inputs="raw_orders,customers" schema_change="append">
import pandas as pd
df = load("raw_orders")
</python>
"#;

fn write_daily(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("daily.xml");
    std::fs::write(&path, DAILY).unwrap();
    path
}

#[test]
fn test_pipeline_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_daily(dir.path());

    let pipeline = Pipeline::from_file(&path).unwrap();

    assert_eq!(pipeline.path, path);
    assert_eq!(pipeline.tasks.len(), 1);
    assert_eq!(pipeline.connections.len(), 1);
    assert_eq!(pipeline.tables.len(), 2);

    let task = pipeline.task("daily").unwrap();
    assert_eq!(task.unit_type, "python");
    assert_eq!(task.code, "run daily load");
    assert!(task.is_active());
    assert!(!task.forces_build());

    let raw = pipeline.table("raw_orders").unwrap();
    assert_eq!(raw.unit_type, UnitType::Sql);
    assert_eq!(raw.materialization, "incremental");
    assert_eq!(raw.code, "select * from source.orders");
    assert!(raw.input_ids().is_empty());

    let enrich = pipeline.table("enrich").unwrap();
    assert_eq!(enrich.unit_type, UnitType::Python);
    assert_eq!(enrich.input_ids(), vec!["raw_orders", "customers"]);
    assert!(pipeline.lint().is_empty());
}

#[test]
fn test_connection_password_stays_private() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::from_file(&write_daily(dir.path())).unwrap();
    let connection = pipeline.connection("warehouse").unwrap();

    assert_eq!(connection.password, "hunter2");
    assert!(!format!("{:?}", connection).contains("hunter2"));
    assert!(!serde_json::to_string(&pipeline).unwrap().contains("hunter2"));
}

#[test]
fn test_parse_file_keeps_document_order() {
    let dir = tempfile::tempdir().unwrap();
    let elements = parse_file(&write_daily(dir.path())).unwrap();

    let kinds: Vec<_> = elements
        .iter()
        .filter_map(|e| ElementKind::classify(e.element_type()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ElementKind::Task,
            ElementKind::Connection,
            ElementKind::Unit(UnitType::Sql),
            ElementKind::Unit(UnitType::Python),
        ]
    );
}

#[test]
fn test_file_without_tags_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xml");
    std::fs::write(&path, "just a note, nothing to build\n").unwrap();

    let pipeline = Pipeline::from_file(&path).unwrap();
    assert!(pipeline.is_empty());
}

#[test]
fn test_unreadable_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.xml");

    let err = Pipeline::from_file(&path).unwrap_err();
    assert!(matches!(err, TagParseError::Io { .. }));

    let diag = err.to_diagnostic();
    assert_eq!(diag.code, DiagnosticCode::FileReadError);
    assert_eq!(diag.file(), Some(path.display().to_string().as_str()));
}
