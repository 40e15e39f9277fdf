//! In-memory source backed by a JSON snapshot of a database.
//!
//! A snapshot carries the same information the Firebird catalog queries
//! return, plus the rows:
//!
//! ```json
//! {
//!   "generators": [{ "name": "GEN_ACCOUNT_ID", "value": 42 }],
//!   "tables": [{
//!     "name": "ACCOUNT",
//!     "columns": [
//!       { "name": "ID", "type_code": 8, "length": 4, "not_null": true },
//!       { "name": "BALANCE", "type_code": 8, "subtype": 1, "precision": 10, "scale": -2 }
//!     ],
//!     "primary_key": ["ID"],
//!     "rows": [{ "ID": { "integer": 1 }, "BALANCE": { "decimal": "123.40" } }]
//!   }]
//! }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::core::{
    CatalogReader, ColumnDescriptor, ForeignKey, Generator, Row, RowReader, SourceReader,
    SqlValue, TableSchema,
};
use crate::error::{ExportError, Result};
use crate::format::trim_trailing;

/// One table of a snapshot: its schema and rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotTable {
    pub schema: TableSchema,
    pub rows: Vec<Row>,
}

/// A complete database snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub tables: Vec<SnapshotTable>,
    pub generators: Vec<Generator>,
}

#[derive(Deserialize)]
struct RawTable {
    #[serde(flatten)]
    schema: TableSchema,
    #[serde(default)]
    rows: Vec<BTreeMap<String, Option<SqlValue>>>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    tables: Vec<RawTable>,
    #[serde(default)]
    generators: Vec<Generator>,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawSnapshot = serde_json::from_str(json)?;
        let tables = raw
            .tables
            .into_iter()
            .map(|t| SnapshotTable {
                schema: t.schema,
                rows: t
                    .rows
                    .into_iter()
                    .map(|cells| {
                        cells
                            .into_iter()
                            .map(|(column, value)| (column, value.unwrap_or(SqlValue::Null)))
                            .collect::<Row>()
                    })
                    .collect(),
            })
            .collect();

        let snapshot = Snapshot {
            tables,
            generators: raw.generators,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check structural consistency: unique names, keys naming real columns.
    pub fn validate(&self) -> Result<()> {
        let mut table_names = HashSet::new();
        for table in &self.tables {
            let schema = &table.schema;
            if schema.name.is_empty() {
                return Err(ExportError::Snapshot("table with empty name".into()));
            }
            if !table_names.insert(schema.name.as_str()) {
                return Err(ExportError::Snapshot(format!(
                    "duplicate table {}",
                    schema.name
                )));
            }

            let mut column_names = HashSet::new();
            for column in &schema.columns {
                if !column_names.insert(column.name.as_str()) {
                    return Err(ExportError::Snapshot(format!(
                        "duplicate column {}.{}",
                        schema.name, column.name
                    )));
                }
            }

            for pk in &schema.primary_key {
                if !column_names.contains(pk.as_str()) {
                    return Err(ExportError::Snapshot(format!(
                        "primary key column {}.{} is not declared",
                        schema.name, pk
                    )));
                }
            }
        }

        let mut generator_names = HashSet::new();
        for generator in &self.generators {
            if !generator_names.insert(generator.name.as_str()) {
                return Err(ExportError::Snapshot(format!(
                    "duplicate generator {}",
                    generator.name
                )));
            }
        }

        Ok(())
    }
}

/// Source reading from a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    snapshot: Snapshot,
}

impl SnapshotReader {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Open a snapshot file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(Snapshot::load(path)?))
    }

    fn table(&self, name: &str) -> Result<&SnapshotTable> {
        self.snapshot
            .tables
            .iter()
            .find(|t| t.schema.name == name)
            .ok_or_else(|| ExportError::Snapshot(format!("unknown table {}", name)))
    }
}

impl CatalogReader for SnapshotReader {
    fn list_tables(&mut self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .snapshot
            .tables
            .iter()
            .map(|t| t.schema.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        Ok(self.table(table)?.schema.columns.clone())
    }

    fn primary_key(&mut self, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.schema.primary_key.clone())
    }

    fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        Ok(self.table(table)?.schema.foreign_keys.clone())
    }

    fn generators(&mut self) -> Result<Vec<Generator>> {
        let mut generators = self.snapshot.generators.clone();
        generators.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(generators)
    }
}

impl RowReader for SnapshotReader {
    fn rows(&mut self, table: &TableSchema) -> Result<Vec<Row>> {
        let rows: Vec<Row> = self
            .table(&table.name)?
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(column, value)| {
                        let value = match value {
                            SqlValue::Text(s) => SqlValue::Text(trim_trailing(s).to_string()),
                            other => other.clone(),
                        };
                        (column, value)
                    })
                    .collect::<Row>()
            })
            .collect();
        Ok(rows)
    }
}

impl SourceReader for SnapshotReader {
    fn db_type(&self) -> &str {
        "snapshot"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    const ACCOUNT_JSON: &str = r#"{
        "generators": [
            { "name": "GEN_Z", "value": 1 },
            { "name": "GEN_ACCOUNT_ID", "value": 42 }
        ],
        "tables": [
            {
                "name": "ORDERS",
                "columns": [{ "name": "ID", "type_code": 8 }]
            },
            {
                "name": "ACCOUNT",
                "columns": [
                    { "name": "ID", "type_code": 8, "length": 4, "not_null": true },
                    { "name": "BALANCE", "type_code": 8, "subtype": 1, "precision": 10, "scale": -2 },
                    { "name": "NAME", "type_code": 37, "length": 50 }
                ],
                "primary_key": ["ID"],
                "rows": [
                    { "ID": { "integer": 1 }, "BALANCE": { "decimal": "123.40" }, "NAME": { "text": "Bob " } },
                    { "ID": { "integer": 2 }, "BALANCE": null }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = Snapshot::from_json(ACCOUNT_JSON).unwrap();
        assert_eq!(snapshot.tables.len(), 2);
        let account = &snapshot.tables[1];
        assert_eq!(account.schema.columns[1].scale, Some(-2));
        assert_eq!(account.rows.len(), 2);
        assert_eq!(
            account.rows[0].get("BALANCE"),
            Some(&SqlValue::Decimal(Decimal::from_str("123.40").unwrap()))
        );
        assert_eq!(account.rows[1].get("BALANCE"), Some(&SqlValue::Null));
        assert!(account.rows[1].get("NAME").is_none());
    }

    #[test]
    fn test_reader_orders_tables_and_generators() {
        let mut reader = SnapshotReader::new(Snapshot::from_json(ACCOUNT_JSON).unwrap());
        assert_eq!(reader.list_tables().unwrap(), vec!["ACCOUNT", "ORDERS"]);
        let names: Vec<_> = reader
            .generators()
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["GEN_ACCOUNT_ID", "GEN_Z"]);
    }

    #[test]
    fn test_reader_trims_text() {
        let mut reader = SnapshotReader::new(Snapshot::from_json(ACCOUNT_JSON).unwrap());
        let schema = reader.table_schema("ACCOUNT").unwrap();
        assert_eq!(schema.primary_key, vec!["ID"]);
        let rows = reader.rows(&schema).unwrap();
        assert_eq!(rows[0].get("NAME"), Some(&SqlValue::Text("Bob".to_string())));
    }

    #[test]
    fn test_reader_trims_separator_characters() {
        let json = r#"{ "tables": [{
            "name": "T",
            "columns": [{ "name": "CODE", "type_code": 14, "length": 8 }],
            "rows": [{ "CODE": { "text": "AB\u001f\u001c  " } }]
        }] }"#;
        let mut reader = SnapshotReader::new(Snapshot::from_json(json).unwrap());
        let schema = reader.table_schema("T").unwrap();
        let rows = reader.rows(&schema).unwrap();
        assert_eq!(rows[0].get("CODE"), Some(&SqlValue::Text("AB".to_string())));
    }

    #[test]
    fn test_unknown_table() {
        let mut reader = SnapshotReader::new(Snapshot::default());
        assert!(matches!(
            reader.columns("NOPE"),
            Err(ExportError::Snapshot(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_tables() {
        let json = r#"{ "tables": [
            { "name": "A", "columns": [] },
            { "name": "A", "columns": [] }
        ] }"#;
        assert!(matches!(
            Snapshot::from_json(json),
            Err(ExportError::Snapshot(_))
        ));
    }

    #[test]
    fn test_rejects_undeclared_pk_column() {
        let json = r#"{ "tables": [
            { "name": "A", "columns": [{ "name": "ID", "type_code": 8 }], "primary_key": ["KEY"] }
        ] }"#;
        let err = Snapshot::from_json(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid snapshot: primary key column A.KEY is not declared"
        );
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        assert!(matches!(
            Snapshot::from_json("{ not json"),
            Err(ExportError::Json(_))
        ));
    }
}
