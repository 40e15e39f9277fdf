//! # fdb2xml
//!
//! Export a Firebird database to one flat, deterministic XML document.
//!
//! The document carries the schema (generators, tables, columns, primary and
//! foreign keys) followed by every row of every user table:
//!
//! - **Type mapping** from native field codes to canonical SQL type names
//! - **Value formatting** with fixed date/time layouts and base64 for
//!   non-UTF-8 binary data
//! - **Stable output**: tables and generators sorted by name, cells in
//!   declared column order, two-space indentation
//! - **Sources**: a live database over the native client (feature
//!   `firebird`) or a JSON snapshot
//!
//! ## Example
//!
//! ```rust,no_run
//! use fdb2xml::{Config, Exporter};
//! use std::path::Path;
//!
//! fn main() -> fdb2xml::Result<()> {
//!     let config = Config::load("fdb2xml.yaml")?;
//!     let result = Exporter::new(config).run(Path::new("shop.fdb"), None)?;
//!     println!("{} elements -> {}", result.elements, result.output.display());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod document;
pub mod error;
pub mod format;
pub mod orchestrator;
pub mod source;
pub mod typemap;
pub mod xml;

// Re-exports for convenient access
pub use config::{Config, ExportConfig, OutputConfig, SourceConfig};
pub use core::{
    CatalogReader, ColumnDescriptor, ForeignKey, Generator, Row, RowReader, SourceReader,
    SqlValue, TableSchema,
};
pub use document::{Assembler, AssemblyStats, DocumentMeta, ExportDocument, MissingColumnPolicy};
pub use error::{ExportError, Result};
pub use format::{format_value, Encoding, Formatted};
pub use orchestrator::{ExportResult, Exporter};
pub use source::{Snapshot, SnapshotReader, SourceImpl};
pub use typemap::map_type;
