//! Source databases the exporter can read from.
//!
//! - [`snapshot`]: JSON snapshot of a database, always available
//! - [`firebird`]: live Firebird database over the native client
//!   (cargo feature `firebird`)
//! - [`locate`]: native client library discovery

#[cfg(feature = "firebird")]
pub mod firebird;
pub mod locate;
pub mod snapshot;

use std::path::Path;

use tracing::debug;

use crate::config::SourceConfig;
use crate::core::{
    CatalogReader, ColumnDescriptor, ForeignKey, Generator, Row, RowReader, SourceReader,
    TableSchema,
};
use crate::error::Result;

#[cfg(feature = "firebird")]
pub use firebird::FirebirdReader;
pub use snapshot::{Snapshot, SnapshotReader, SnapshotTable};

/// Enum wrapper for the compiled-in sources.
///
/// Static dispatch keeps the assembler generic without trait objects.
pub enum SourceImpl {
    Snapshot(SnapshotReader),
    #[cfg(feature = "firebird")]
    Firebird(FirebirdReader),
}

impl SourceImpl {
    /// Open the source for an input file.
    ///
    /// A `.json` input is a snapshot; anything else is a Firebird database.
    pub fn open(config: &SourceConfig, input: &Path) -> Result<Self> {
        if is_snapshot(input) {
            debug!("Opening snapshot {}", input.display());
            return Ok(Self::Snapshot(SnapshotReader::open(input)?));
        }
        Self::open_firebird(config, input)
    }

    #[cfg(feature = "firebird")]
    fn open_firebird(config: &SourceConfig, input: &Path) -> Result<Self> {
        Ok(Self::Firebird(FirebirdReader::open(config, input)?))
    }

    #[cfg(not(feature = "firebird"))]
    fn open_firebird(config: &SourceConfig, input: &Path) -> Result<Self> {
        tracing::error!(
            "{} needs the native Firebird client; this build has no `firebird` feature",
            input.display()
        );
        Err(crate::error::ExportError::ClientLibrary {
            searched: locate::ClientSearch::new(config, input).searched(),
        })
    }
}

/// True when the input should be read as a JSON snapshot.
pub fn is_snapshot(input: &Path) -> bool {
    input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl CatalogReader for SourceImpl {
    fn list_tables(&mut self) -> Result<Vec<String>> {
        match self {
            Self::Snapshot(s) => s.list_tables(),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.list_tables(),
        }
    }

    fn columns(&mut self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        match self {
            Self::Snapshot(s) => s.columns(table),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.columns(table),
        }
    }

    fn primary_key(&mut self, table: &str) -> Result<Vec<String>> {
        match self {
            Self::Snapshot(s) => s.primary_key(table),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.primary_key(table),
        }
    }

    fn foreign_keys(&mut self, table: &str) -> Result<Vec<ForeignKey>> {
        match self {
            Self::Snapshot(s) => s.foreign_keys(table),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.foreign_keys(table),
        }
    }

    fn generators(&mut self) -> Result<Vec<Generator>> {
        match self {
            Self::Snapshot(s) => s.generators(),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.generators(),
        }
    }
}

impl RowReader for SourceImpl {
    fn rows(&mut self, table: &TableSchema) -> Result<Vec<Row>> {
        match self {
            Self::Snapshot(s) => s.rows(table),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.rows(table),
        }
    }
}

impl SourceReader for SourceImpl {
    fn db_type(&self) -> &str {
        match self {
            Self::Snapshot(s) => s.db_type(),
            #[cfg(feature = "firebird")]
            Self::Firebird(s) => s.db_type(),
        }
    }
}
