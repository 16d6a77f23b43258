//! Integration tests for input loading and settings resolution.

use std::fs;
use std::path::PathBuf;

use recon_cli::inputs::{load_schema, load_settings_with, load_source_table};
use recon_match::{MatchSettings, pair_tables, suggest_mappings};
use recon_model::{ColumnProfile, DataType, PairingMode, SourceColumn, SourceTable, TableProfile};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn test_source_table_from_json() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "left_table.json",
        r#"{
            "name": "bank1_customers",
            "columns": [
                {"name": "customer_id", "dtype": "object", "values": ["C1", "C2", null]},
                {"name": "dob", "dtype": "object"}
            ]
        }"#,
    );
    let table = load_source_table(&path).unwrap();
    assert_eq!(table.name, "bank1_customers");
    assert_eq!(table.columns.len(), 2);
    assert_eq!(table.columns[0].non_null().count(), 2);
    assert!(table.columns[1].values.is_empty());
}

#[test]
fn test_malformed_table_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "broken_table.json", "{ not json");
    let error = load_source_table(&path).unwrap_err();
    let message = format!("{error:#}");
    assert!(message.contains("failed to parse source table"), "{message}");
    assert!(message.contains("broken_table.json"), "{message}");
}

#[test]
fn test_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.json");
    let error = load_schema(&path).unwrap_err();
    assert!(format!("{error:#}").contains("failed to read schema"));
}

#[test]
fn test_schema_round_trip_and_pairing() {
    let dir = TempDir::new().unwrap();
    let schema = vec![
        TableProfile::new(
            "Customers",
            100,
            vec![ColumnProfile::new("email", DataType::String)],
        ),
        TableProfile::new(
            "Accounts",
            200,
            vec![ColumnProfile::new("accountid", DataType::String).with_primary_key(true)],
        ),
    ];
    let path = write_file(&dir, "schema.json", &serde_json::to_string(&schema).unwrap());
    let loaded = load_schema(&path).unwrap();
    assert_eq!(loaded, schema);

    let outcome = pair_tables(&loaded, &loaded, None, None, &MatchSettings::default());
    assert!(outcome.contains("Customers", "Customers"));
    assert!(outcome.contains("Accounts", "Accounts"));
}

#[test]
fn test_duplicate_table_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    let schema = vec![
        TableProfile::new("Loans", 10, Vec::new()),
        TableProfile::new("Loans", 20, Vec::new()),
    ];
    let path = write_file(&dir, "dupes.json", &serde_json::to_string(&schema).unwrap());
    let error = load_schema(&path).unwrap_err();
    assert!(error.to_string().contains("duplicate table name"));
}

#[test]
fn test_settings_default_without_config() {
    let settings = load_settings_with(None, no_env).unwrap();
    assert_eq!(settings, MatchSettings::default());
}

#[test]
fn test_partial_config_keeps_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "partial_settings.json",
        r#"{"auto_threshold": 0.8, "table": {"mode": "strict"}}"#,
    );
    let settings = load_settings_with(Some(&path), no_env).unwrap();
    assert_eq!(settings.auto_threshold, 0.8);
    assert_eq!(settings.table.mode, PairingMode::Strict);
    assert_eq!(settings.table.min_score, 0.45);
    assert_eq!(settings.sample_n, 2000);
}

#[test]
fn test_environment_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "env_settings.json", r#"{"auto_threshold": 0.8}"#);
    let settings = load_settings_with(Some(&path), |key| {
        (key == "MATCH_AUTO_THRESHOLD").then(|| "0.55".to_string())
    })
    .unwrap();
    assert_eq!(settings.auto_threshold, 0.55);
}

#[test]
fn test_invalid_environment_value_fails() {
    let error = load_settings_with(None, |key| {
        (key == "TABLEPAIR_MODE").then(|| "sideways".to_string())
    })
    .unwrap_err();
    assert!(format!("{error:#}").contains("invalid settings in environment"));
}

#[test]
fn test_loaded_tables_feed_column_matching() {
    let dir = TempDir::new().unwrap();
    let left = SourceTable::new(
        "l",
        vec![SourceColumn::with_values("acct_id", "int64", ["1", "2", "3"])],
    );
    let right = SourceTable::new(
        "r",
        vec![SourceColumn::with_values("account_number", "int64", ["1", "2", "3"])],
    );
    let left_path = write_file(&dir, "match_left.json", &serde_json::to_string(&left).unwrap());
    let right_path = write_file(&dir, "match_right.json", &serde_json::to_string(&right).unwrap());
    let left = load_source_table(&left_path).unwrap();
    let right = load_source_table(&right_path).unwrap();
    let result = suggest_mappings(&left, &right, 100, Some(0.6), &MatchSettings::default());
    assert_eq!(result.candidates.len(), 1);
    assert!(result.candidates[0].decision.is_auto());
}
