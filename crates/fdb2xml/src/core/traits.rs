//! Core traits for reading a source database.
//!
//! - [`CatalogReader`]: enumerates tables and reads their metadata
//! - [`RowReader`]: reads table rows
//!
//! Both are blocking and take `&mut self`: a source owns a single session and
//! runs one query at a time.

use crate::error::Result;

use super::schema::{ColumnDescriptor, ForeignKey, Generator, TableSchema};
use super::value::Row;

/// Read schema metadata from a source database.
pub trait CatalogReader {
    /// User table names, lexicographically ordered.
    fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Column descriptors in declared field-position order.
    fn columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Primary key column names (empty when the table has none).
    fn primary_key(&mut self, table: &str) -> Result<Vec<String>>;

    /// Foreign key constraints in catalog order.
    fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>>;

    /// User generators with their current values, ordered by name.
    fn generators(&mut self) -> Result<Vec<Generator>>;

    /// Read the full schema of one table.
    ///
    /// Template method over the individual metadata reads.
    fn table_schema(&mut self, table: &str) -> Result<TableSchema> {
        Ok(TableSchema {
            name: table.to_string(),
            columns: self.columns(table)?,
            primary_key: self.primary_key(table)?,
            foreign_keys: self.foreign_keys(table)?,
        })
    }
}

/// Read row data from a source database.
pub trait RowReader {
    /// All rows of a table.
    ///
    /// Fixed-width text values are returned without their trailing padding.
    fn rows(&mut self, table: &TableSchema) -> Result<Vec<Row>>;
}

/// A complete source: catalog plus rows over one session.
pub trait SourceReader: CatalogReader + RowReader {
    /// Short identifier for logs (e.g. "firebird", "snapshot").
    fn db_type(&self) -> &str;
}
