//! Document assembly: catalog and rows into one ordered export tree.
//!
//! The assembler makes a single pass over the source:
//!
//! 1. generators, sorted by name
//! 2. per table, in catalog order: schema (columns, primary key, foreign keys),
//!    then rows
//!
//! Cells are emitted in the table's declared column order, never in the
//! order a row reader happens to return its keys.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::{CatalogReader, ForeignKey, Generator, Row, RowReader, SqlValue, TableSchema};
use crate::error::{ExportError, Result};
use crate::format::{format_value, Formatted};
use crate::typemap;

/// Format of the `exported` attribute.
pub const EXPORTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// What to do when a row has no value for a declared column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingColumnPolicy {
    /// Emit the cell as NULL and log a warning.
    #[default]
    Null,
    /// Abort the export.
    Error,
}

/// Attributes of the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMeta {
    /// Base name of the exported database file.
    pub source: String,
    /// Export start time, local, seconds precision.
    pub exported: NaiveDateTime,
}

impl DocumentMeta {
    pub fn exported_attr(&self) -> String {
        self.exported.format(EXPORTED_FORMAT).to_string()
    }
}

/// A column as it appears in the schema section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub pk: bool,
}

/// A table in the schema section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTable {
    pub name: String,
    pub columns: Vec<SchemaColumn>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// One formatted cell of a data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub name: String,
    pub type_name: String,
    pub value: Formatted,
}

/// One row in the data section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRow {
    pub cells: Vec<Cell>,
}

/// A table in the data section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    pub name: String,
    pub rows: Vec<DataRow>,
}

/// The fully materialized export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub meta: DocumentMeta,
    pub generators: Vec<Generator>,
    pub schema: Vec<SchemaTable>,
    pub data: Vec<DataTable>,
}

impl ExportDocument {
    /// Number of elements below the root.
    ///
    /// Counts `schema`, `data`, the optional `generators` wrapper, and every
    /// nested element.
    pub fn element_count(&self) -> usize {
        let mut count = 2;
        if !self.generators.is_empty() {
            count += 1 + self.generators.len();
        }
        for table in &self.schema {
            count += 1 + table.columns.len() + table.foreign_keys.len();
        }
        for table in &self.data {
            count += 1;
            for row in &table.rows {
                count += 1 + row.cells.len();
            }
        }
        count
    }

    /// Total data rows across all tables.
    pub fn row_count(&self) -> usize {
        self.data.iter().map(|t| t.rows.len()).sum()
    }
}

/// Counters gathered while assembling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyStats {
    pub tables: usize,
    pub rows: usize,
    /// Cells emitted as NULL because the row lacked the column.
    pub missing_cells: usize,
    /// Columns whose native type code has no mapping.
    pub unknown_types: usize,
}

/// Builds an [`ExportDocument`] from a source.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    missing_columns: MissingColumnPolicy,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_columns(mut self, policy: MissingColumnPolicy) -> Self {
        self.missing_columns = policy;
        self
    }

    /// Read everything from the source and assemble the document.
    pub fn assemble<S>(
        &self,
        source: &mut S,
        meta: DocumentMeta,
    ) -> Result<(ExportDocument, AssemblyStats)>
    where
        S: CatalogReader + RowReader + ?Sized,
    {
        let mut stats = AssemblyStats::default();

        let mut generators = source.generators()?;
        generators.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("{} generators", generators.len());

        let tables = source.list_tables()?;
        info!("{} tables: {}", tables.len(), tables.join(", "));

        let mut schema = Vec::with_capacity(tables.len());
        let mut data = Vec::with_capacity(tables.len());

        for name in &tables {
            let table = source.table_schema(name)?;
            let (schema_table, unknown) = schema_section(&table);
            stats.unknown_types += unknown;

            let rows = source.rows(&table)?;
            info!("  {}: {} rows", table.name, rows.len());

            let data_table = self.data_section(&table, &schema_table, &rows, &mut stats)?;
            stats.tables += 1;
            stats.rows += data_table.rows.len();

            schema.push(schema_table);
            data.push(data_table);
        }

        let document = ExportDocument {
            meta,
            generators,
            schema,
            data,
        };
        Ok((document, stats))
    }

    fn data_section(
        &self,
        table: &TableSchema,
        schema_table: &SchemaTable,
        rows: &[Row],
        stats: &mut AssemblyStats,
    ) -> Result<DataTable> {
        let mut missing = 0usize;
        let mut extra_keys_warned = false;
        let mut out = Vec::with_capacity(rows.len());

        for row in rows {
            if !extra_keys_warned {
                if let Some(extra) = row.columns().find(|c| table.column(c).is_none()) {
                    warn!(
                        "Table {}: row key '{}' is not a declared column; ignored",
                        table.name, extra
                    );
                    extra_keys_warned = true;
                }
            }

            let mut cells = Vec::with_capacity(schema_table.columns.len());
            for column in &schema_table.columns {
                let value = match row.get(&column.name) {
                    Some(value) => format_value(value),
                    None => {
                        if self.missing_columns == MissingColumnPolicy::Error {
                            return Err(ExportError::missing_column(&table.name, &column.name));
                        }
                        missing += 1;
                        format_value(&SqlValue::Null)
                    }
                };
                cells.push(Cell {
                    name: column.name.clone(),
                    type_name: column.type_name.clone(),
                    value,
                });
            }
            out.push(DataRow { cells });
        }

        if missing > 0 {
            warn!(
                "Table {}: {} cells had no value in their row and were exported as NULL",
                table.name, missing
            );
            stats.missing_cells += missing;
        }

        Ok(DataTable {
            name: table.name.clone(),
            rows: out,
        })
    }
}

/// Schema block for one table; also returns the count of unmapped types.
fn schema_section(table: &TableSchema) -> (SchemaTable, usize) {
    let mut unknown = 0;
    let columns = table
        .columns
        .iter()
        .map(|col| {
            if !typemap::is_known_type(col.type_code) {
                warn!(
                    "Table {}: column {} has unknown type code {}",
                    table.name, col.name, col.type_code
                );
                unknown += 1;
            }
            SchemaColumn {
                name: col.name.clone(),
                type_name: col.canonical_type(),
                not_null: col.not_null,
                pk: table.is_pk_column(&col.name),
            }
        })
        .collect();

    let schema_table = SchemaTable {
        name: table.name.clone(),
        columns,
        foreign_keys: table.foreign_keys.clone(),
    };
    (schema_table, unknown)
}
