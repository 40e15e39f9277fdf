//! Core abstractions for database extraction.
//!
//! - [`schema`]: Table, column, key, and generator metadata types
//! - [`value`]: Typed cell values and rows
//! - [`traits`]: Catalog and row reader traits implemented by sources
//!
//! Sources (`source::snapshot`, `source::firebird`) implement the traits; the
//! document assembler only ever sees the traits, so it can be driven by an
//! in-memory snapshot in tests.

pub mod schema;
pub mod traits;
pub mod value;

pub use schema::{ColumnDescriptor, ForeignKey, Generator, TableSchema};
pub use traits::{CatalogReader, RowReader, SourceReader};
pub use value::{Row, SqlValue};
