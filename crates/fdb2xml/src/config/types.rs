//! Configuration type definitions.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::document::MissingColumnPolicy;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Source database connection settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Output file settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Export behavior settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Source database (Firebird embedded) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Username (default: "SYSDBA").
    #[serde(default = "default_user")]
    pub user: String,

    /// Password (default: "masterkey"). Only sent on server connections.
    #[serde(default = "default_password")]
    pub password: String,

    /// Server host. When unset the database file is opened embedded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Explicit path to the native client library. Skips the search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_library: Option<PathBuf>,

    /// Extra directories searched for the client library, before the
    /// built-in locations.
    #[serde(default)]
    pub search_dirs: Vec<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
            password: default_password(),
            host: None,
            client_library: None,
            search_dirs: Vec::new(),
        }
    }
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("client_library", &self.client_library)
            .field("search_dirs", &self.search_dirs)
            .finish()
    }
}

/// Output file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory. Defaults to the input file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Export behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Handling of rows that lack a declared column (default: null).
    #[serde(default)]
    pub missing_columns: MissingColumnPolicy,
}

fn default_user() -> String {
    "SYSDBA".to_string()
}

fn default_password() -> String {
    "masterkey".to_string()
}
