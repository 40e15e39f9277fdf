//! CLI integration tests for fdb2xml.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes for error conditions, and end-to-end export of a snapshot.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

/// Get a command for the fdb2xml binary.
fn cmd() -> Command {
    Command::cargo_bin("fdb2xml").unwrap()
}

const SHOP_SNAPSHOT: &str = r#"{
  "generators": [{ "name": "GEN_ACCOUNT_ID", "value": 42 }],
  "tables": [{
    "name": "ACCOUNT",
    "columns": [
      { "name": "ID", "type_code": 8, "length": 4, "not_null": true },
      { "name": "BALANCE", "type_code": 8, "subtype": 1, "length": 4, "precision": 10, "scale": -2 },
      { "name": "NAME", "type_code": 37, "length": 50 }
    ],
    "primary_key": ["ID"],
    "rows": [
      { "ID": { "integer": 1 }, "BALANCE": { "decimal": "123.40" }, "NAME": { "text": "Bob " } }
    ]
  }]
}"#;

fn write_snapshot(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_options() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<INPUT>"))
        .stdout(predicate::str::contains("--outdir"))
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fdb2xml"));
}

#[test]
fn test_log_format_default() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_input_is_required() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("<INPUT>"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_missing_input_exits_1() {
    cmd()
        .arg("/nonexistent/path/db.fdb")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input not found"));
}

#[test]
fn test_missing_config_file_exits_7() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.json", SHOP_SNAPSHOT);

    cmd()
        .arg(&input)
        .args(["--config", "/nonexistent/fdb2xml.yaml"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_config_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.json", SHOP_SNAPSHOT);
    let config = write_snapshot(dir.path(), "fdb2xml.yaml", "source:\n  user: \"\"\n");

    cmd()
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("source.user"));
}

#[test]
fn test_unknown_log_format_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.json", SHOP_SNAPSHOT);

    cmd()
        .arg(&input)
        .args(["--log-format", "xml"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_snapshot_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "broken.json", "{ not json");

    cmd().arg(&input).assert().failure();
    assert!(!dir.path().join("broken.xml").exists());
}

#[cfg(not(feature = "firebird"))]
#[test]
fn test_fdb_without_client_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.fdb", "");

    cmd()
        .arg(&input)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("client library"));
    assert!(!dir.path().join("shop.xml").exists());
}

// =============================================================================
// Export Tests
// =============================================================================

#[test]
fn test_export_snapshot_next_to_input() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.json", SHOP_SNAPSHOT);

    cmd()
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("elements ->"))
        .stdout(predicate::str::contains("Done!"))
        .stdout(predicate::str::contains("KB"));

    let xml = std::fs::read_to_string(dir.path().join("shop.xml")).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<database source=\"shop.json\""));
    assert!(xml.contains("<generator name=\"GEN_ACCOUNT_ID\" value=\"42\"/>"));
    assert!(xml.contains("<col name=\"NAME\" type=\"VARCHAR(50)\">Bob</col>"));
}

#[test]
fn test_export_to_outdir() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.json", SHOP_SNAPSHOT);
    let outdir = dir.path().join("out").join("xml");

    cmd().arg(&input).arg("-o").arg(&outdir).assert().success();

    assert!(outdir.join("shop.xml").is_file());
    assert!(!dir.path().join("shop.xml").exists());
}

#[test]
fn test_output_json() {
    let dir = TempDir::new().unwrap();
    let input = write_snapshot(dir.path(), "shop.json", SHOP_SNAPSHOT);

    let output = cmd()
        .arg(&input)
        .arg("--output-json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let result: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(result["source"], "shop.json");
    assert_eq!(result["db_type"], "snapshot");
    assert_eq!(result["tables"], 1);
    assert_eq!(result["rows"], 1);
    // schema, generators, generator, table, 3 columns, data, table, row, 3 cols
    assert_eq!(result["elements"], 13);
}

#[test]
fn test_strict_missing_columns_exits_2() {
    let dir = TempDir::new().unwrap();
    let snapshot = SHOP_SNAPSHOT.replace(r#", "NAME": { "text": "Bob " }"#, "");
    let input = write_snapshot(dir.path(), "shop.json", &snapshot);
    let config = write_snapshot(
        dir.path(),
        "fdb2xml.yaml",
        "export:\n  missing_columns: error\n",
    );

    cmd()
        .arg(&input)
        .arg("-c")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("NAME"));
}
