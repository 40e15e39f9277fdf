//! Error types for the export library.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for configuration and input errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;

/// Exit code for source database failures.
pub const EXIT_SOURCE_ERROR: u8 = 2;

/// Exit code for XML serialization failures.
pub const EXIT_OUTPUT_ERROR: u8 = 3;

/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The database file to export does not exist
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// No native client library could be loaded
    #[error("No usable Firebird client library found (searched: {})", display_paths(.searched))]
    ClientLibrary { searched: Vec<PathBuf> },

    /// Source database connection or query error
    #[error("Source database error: {0}")]
    Source(String),

    /// Snapshot file is structurally invalid
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    /// A row lacked a column declared in the table schema (strict mode)
    #[error("Row in table {table} has no value for column {column}")]
    MissingColumn { table: String, column: String },

    /// XML serialization failed
    #[error("XML error: {0}")]
    Xml(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExportError {
    /// Create a Source error from any displayable driver error.
    pub fn driver(err: impl std::fmt::Display) -> Self {
        ExportError::Source(err.to_string())
    }

    /// Create a MissingColumn error.
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        ExportError::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ExportError::Config(_)
            | ExportError::InputNotFound(_)
            | ExportError::ClientLibrary { .. }
            | ExportError::Snapshot(_)
            | ExportError::Yaml(_)
            | ExportError::Json(_) => EXIT_CONFIG_ERROR,
            ExportError::Source(_) | ExportError::MissingColumn { .. } => EXIT_SOURCE_ERROR,
            ExportError::Xml(_) => EXIT_OUTPUT_ERROR,
            ExportError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "nothing".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;
