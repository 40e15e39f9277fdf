//! Firebird source over the native client (`rsfbclient`).
//!
//! Rows are read with an explicit projection in declared column order.
//! Scaled exact numerics are selected as text so their scale survives, and
//! DATE/TIME columns are narrowed from the driver's timestamp.

use std::path::Path;
use std::str::FromStr;

use rsfbclient::prelude::*;
use rsfbclient::{Row as FbRow, SimpleConnection, SqlType};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::SourceConfig;
use crate::core::{
    CatalogReader, ColumnDescriptor, ForeignKey, Generator, Row, RowReader, SourceReader,
    SqlValue, TableSchema,
};
use crate::error::{ExportError, Result};
use crate::format::trim_trailing;
use crate::typemap::field_type;

use super::locate::ClientSearch;

const LIST_TABLES: &str = "\
SELECT TRIM(RDB$RELATION_NAME) \
FROM RDB$RELATIONS \
WHERE RDB$SYSTEM_FLAG = 0 AND RDB$VIEW_BLR IS NULL \
ORDER BY RDB$RELATION_NAME";

const LIST_COLUMNS: &str = "\
SELECT TRIM(rf.RDB$FIELD_NAME), f.RDB$FIELD_TYPE, f.RDB$FIELD_SUB_TYPE, \
       f.RDB$FIELD_LENGTH, f.RDB$FIELD_PRECISION, f.RDB$FIELD_SCALE, \
       rf.RDB$NULL_FLAG, f.RDB$CHARACTER_LENGTH \
FROM RDB$RELATION_FIELDS rf \
JOIN RDB$FIELDS f ON rf.RDB$FIELD_SOURCE = f.RDB$FIELD_NAME \
WHERE rf.RDB$RELATION_NAME = ? \
ORDER BY rf.RDB$FIELD_POSITION";

const PRIMARY_KEY: &str = "\
SELECT TRIM(sg.RDB$FIELD_NAME) \
FROM RDB$RELATION_CONSTRAINTS rc \
JOIN RDB$INDEX_SEGMENTS sg ON rc.RDB$INDEX_NAME = sg.RDB$INDEX_NAME \
WHERE rc.RDB$RELATION_NAME = ? AND rc.RDB$CONSTRAINT_TYPE = 'PRIMARY KEY' \
ORDER BY sg.RDB$FIELD_POSITION";

const FOREIGN_KEYS: &str = "\
SELECT TRIM(rc.RDB$CONSTRAINT_NAME), TRIM(sg.RDB$FIELD_NAME), \
       TRIM(rc2.RDB$RELATION_NAME), TRIM(sg2.RDB$FIELD_NAME) \
FROM RDB$RELATION_CONSTRAINTS rc \
JOIN RDB$INDEX_SEGMENTS sg ON rc.RDB$INDEX_NAME = sg.RDB$INDEX_NAME \
JOIN RDB$REF_CONSTRAINTS ref ON rc.RDB$CONSTRAINT_NAME = ref.RDB$CONSTRAINT_NAME \
JOIN RDB$RELATION_CONSTRAINTS rc2 ON ref.RDB$CONST_NAME_UQ = rc2.RDB$CONSTRAINT_NAME \
JOIN RDB$INDEX_SEGMENTS sg2 ON rc2.RDB$INDEX_NAME = sg2.RDB$INDEX_NAME \
WHERE rc.RDB$RELATION_NAME = ? AND rc.RDB$CONSTRAINT_TYPE = 'FOREIGN KEY'";

const LIST_GENERATORS: &str = "\
SELECT TRIM(RDB$GENERATOR_NAME) \
FROM RDB$GENERATORS \
WHERE RDB$SYSTEM_FLAG = 0 \
ORDER BY RDB$GENERATOR_NAME";

type ColumnRow = (
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
);

/// Catalog and row reader over one Firebird session.
///
/// The connection is closed when the reader is dropped.
pub struct FirebirdReader {
    conn: SimpleConnection,
}

impl FirebirdReader {
    /// Connect to a database, trying every discovered client library in turn.
    pub fn open(config: &SourceConfig, db_path: &Path) -> Result<Self> {
        let search = ClientSearch::new(config, db_path);
        let candidates = search.candidates();
        if candidates.is_empty() {
            return Err(ExportError::ClientLibrary {
                searched: search.searched(),
            });
        }

        for library in candidates {
            info!("Trying client library: {}", library.display());
            match connect(config, &library, db_path) {
                Ok(conn) => {
                    info!("Connected to {}", db_path.display());
                    return Ok(Self { conn });
                }
                Err(e) => warn!("Client library {} failed: {}", library.display(), e),
            }
        }

        Err(ExportError::ClientLibrary {
            searched: search.searched(),
        })
    }

    fn select_list(table: &TableSchema) -> String {
        table
            .columns
            .iter()
            .map(|col| {
                let ident = quote_ident(&col.name);
                if is_scaled_numeric(col) {
                    format!("CAST({} AS VARCHAR(64))", ident)
                } else {
                    ident
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn connect(config: &SourceConfig, library: &Path, db_path: &Path) -> Result<SimpleConnection> {
    let lib = library.to_string_lossy().into_owned();
    let db_name = db_path.to_string_lossy().into_owned();

    let conn: SimpleConnection = match config.host {
        Some(ref host) => rsfbclient::builder_native()
            .with_dyn_load(lib)
            .with_remote()
            .host(host.as_str())
            .db_name(db_name)
            .user(config.user.as_str())
            .pass(config.password.as_str())
            .connect()
            .map_err(ExportError::driver)?
            .into(),
        None => rsfbclient::builder_native()
            .with_dyn_load(lib)
            .with_embedded()
            .db_name(db_name)
            .user(config.user.as_str())
            .connect()
            .map_err(ExportError::driver)?
            .into(),
    };
    Ok(conn)
}

impl CatalogReader for FirebirdReader {
    fn list_tables(&mut self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = self
            .conn
            .query(LIST_TABLES, ())
            .map_err(ExportError::driver)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    fn columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows: Vec<ColumnRow> = self
            .conn
            .query(LIST_COLUMNS, (table,))
            .map_err(ExportError::driver)?;

        Ok(rows
            .into_iter()
            .map(
                |(name, type_code, subtype, length, precision, scale, null_flag, char_length)| {
                    ColumnDescriptor {
                        name,
                        type_code: narrow(type_code),
                        subtype: subtype.map(narrow),
                        length: length.map(narrow).unwrap_or(0),
                        precision: precision.map(narrow),
                        scale: scale.map(narrow),
                        char_length: char_length.map(narrow),
                        not_null: null_flag == Some(1),
                    }
                },
            )
            .collect())
    }

    fn primary_key(&mut self, table: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = self
            .conn
            .query(PRIMARY_KEY, (table,))
            .map_err(ExportError::driver)?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String)> = self
            .conn
            .query(FOREIGN_KEYS, (table,))
            .map_err(ExportError::driver)?;
        Ok(rows
            .into_iter()
            .map(|(name, column, ref_table, ref_column)| ForeignKey {
                name,
                column,
                ref_table,
                ref_column,
            })
            .collect())
    }

    fn generators(&mut self) -> Result<Vec<Generator>> {
        let names: Vec<(String,)> = self
            .conn
            .query(LIST_GENERATORS, ())
            .map_err(ExportError::driver)?;

        let mut generators = Vec::with_capacity(names.len());
        for (name,) in names {
            let sql = format!("SELECT GEN_ID({}, 0) FROM RDB$DATABASE", quote_ident(&name));
            let value: Option<(i64,)> = self
                .conn
                .query_first(&sql, ())
                .map_err(ExportError::driver)?;
            let (value,) = value.ok_or_else(|| {
                ExportError::Source(format!("generator {} returned no value", name))
            })?;
            generators.push(Generator { name, value });
        }
        Ok(generators)
    }
}

impl RowReader for FirebirdReader {
    fn rows(&mut self, table: &TableSchema) -> Result<Vec<Row>> {
        if table.columns.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM {}",
            Self::select_list(table),
            quote_ident(&table.name)
        );
        debug!("Reading rows: {}", sql);

        let raw: Vec<FbRow> = self.conn.query(&sql, ()).map_err(ExportError::driver)?;

        let mut rows = Vec::with_capacity(raw.len());
        for fb_row in raw {
            let mut row = Row::new();
            for (col, cell) in table.columns.iter().zip(fb_row.cols) {
                row.insert(col.name.clone(), convert(col, cell.value)?);
            }
            rows.push(row);
        }
        Ok(rows)
    }
}

impl SourceReader for FirebirdReader {
    fn db_type(&self) -> &str {
        "firebird"
    }
}

fn is_scaled_numeric(col: &ColumnDescriptor) -> bool {
    matches!(
        col.type_code,
        field_type::SHORT | field_type::LONG | field_type::INT64
    ) && col.scale.unwrap_or(0) < 0
}

/// Convert a driver value into a cell value for the declared column.
fn convert(col: &ColumnDescriptor, value: SqlType) -> Result<SqlValue> {
    Ok(match value {
        SqlType::Null => SqlValue::Null,
        SqlType::Text(text) if is_scaled_numeric(col) => {
            let decimal = Decimal::from_str(text.trim()).map_err(|e| {
                ExportError::Source(format!("column {}: invalid decimal {:?}: {}", col.name, text, e))
            })?;
            SqlValue::Decimal(decimal)
        }
        SqlType::Text(text) => SqlValue::Text(trim_trailing(&text).to_string()),
        SqlType::Integer(v) => SqlValue::Integer(v),
        SqlType::Floating(v) => SqlValue::Float(v),
        SqlType::Timestamp(ts) => match col.type_code {
            field_type::DATE => SqlValue::Date(ts.date()),
            field_type::TIME => SqlValue::Time(ts.time()),
            _ => SqlValue::Timestamp(ts),
        },
        SqlType::Binary(bytes) => SqlValue::Binary(bytes),
        SqlType::Boolean(b) => SqlValue::Text(if b { "True" } else { "False" }.to_string()),
    })
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn narrow(v: i64) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("ACCOUNT"), "\"ACCOUNT\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_select_list_casts_scaled_numerics() {
        let table = TableSchema {
            name: "ACCOUNT".to_string(),
            columns: vec![
                ColumnDescriptor::new("ID", field_type::LONG),
                ColumnDescriptor::new("BALANCE", field_type::INT64)
                    .with_subtype(1)
                    .with_numeric(18, -2),
            ],
            primary_key: vec![],
            foreign_keys: vec![],
        };
        assert_eq!(
            FirebirdReader::select_list(&table),
            "\"ID\", CAST(\"BALANCE\" AS VARCHAR(64))"
        );
    }

    #[test]
    fn test_convert_narrows_dates() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        let date_col = ColumnDescriptor::new("D", field_type::DATE);
        let time_col = ColumnDescriptor::new("T", field_type::TIME);
        assert_eq!(
            convert(&date_col, SqlType::Timestamp(ts)).unwrap(),
            SqlValue::Date(ts.date())
        );
        assert_eq!(
            convert(&time_col, SqlType::Timestamp(ts)).unwrap(),
            SqlValue::Time(ts.time())
        );
    }

    #[test]
    fn test_convert_decimal_and_text() {
        let col = ColumnDescriptor::new("BALANCE", field_type::LONG)
            .with_subtype(1)
            .with_numeric(10, -2);
        assert_eq!(
            convert(&col, SqlType::Text("123.40".to_string())).unwrap(),
            SqlValue::Decimal(Decimal::from_str("123.40").unwrap())
        );

        let col = ColumnDescriptor::new("CODE", field_type::TEXT).with_length(5);
        assert_eq!(
            convert(&col, SqlType::Text("AB   ".to_string())).unwrap(),
            SqlValue::Text("AB".to_string())
        );
    }
}
