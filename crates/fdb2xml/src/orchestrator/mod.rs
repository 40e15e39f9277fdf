//! Export orchestrator - main workflow coordinator.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::core::SourceReader;
use crate::document::{Assembler, DocumentMeta};
use crate::error::{ExportError, Result};
use crate::source::SourceImpl;
use crate::xml;

/// Export orchestrator.
pub struct Exporter {
    config: Config,
}

/// Result of an export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResult {
    /// Path of the written XML file.
    pub output: PathBuf,

    /// Base name of the exported database, as written to the root element.
    pub source: String,

    /// Source kind ("firebird" or "snapshot").
    pub db_type: String,

    /// Tables exported.
    pub tables: usize,

    /// Rows exported across all tables.
    pub rows: usize,

    /// Elements written below the root.
    pub elements: usize,

    /// Size of the written file.
    pub bytes: u64,

    /// Cells emitted as NULL because the row lacked the column.
    pub missing_cells: usize,

    /// Columns with an unmapped native type.
    pub unknown_types: usize,

    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Exporter {
    /// Create a new exporter.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Export `input` to `<outdir>/<input stem>.xml`.
    ///
    /// `outdir` overrides the configured output directory; with neither the
    /// file is written next to the input.
    pub fn run(&self, input: &Path, outdir: Option<&Path>) -> Result<ExportResult> {
        if !input.exists() {
            return Err(ExportError::InputNotFound(input.to_path_buf()));
        }

        let output = self.output_path(input, outdir)?;
        info!("Input: {}", input.display());
        info!("XML:   {}", output.display());

        let meta = DocumentMeta {
            source: source_name(input),
            exported: now_seconds(),
        };

        info!("Connecting...");
        let mut source = SourceImpl::open(&self.config.source, input)?;
        info!("Connected ({})", source.db_type());

        self.export(&mut source, meta, &output)
    }

    /// Assemble a document from an open source and write it to `output`.
    ///
    /// The whole document is serialized in memory before the file is
    /// written, so a failed run never leaves a partial file behind.
    pub fn export<S>(&self, source: &mut S, meta: DocumentMeta, output: &Path) -> Result<ExportResult>
    where
        S: SourceReader + ?Sized,
    {
        let start = Instant::now();
        let db_type = source.db_type().to_string();
        let source_label = meta.source.clone();

        info!("Reading tables...");
        let assembler = Assembler::new().with_missing_columns(self.config.export.missing_columns);
        let (document, stats) = assembler.assemble(source, meta)?;

        info!("Generating XML...");
        let (bytes, elements) = xml::to_xml_bytes(&document)?;
        drop(document);

        std::fs::write(output, &bytes)?;
        info!("{} elements -> {}", elements, output.display());

        let result = ExportResult {
            output: output.to_path_buf(),
            source: source_label,
            db_type,
            tables: stats.tables,
            rows: stats.rows,
            elements,
            bytes: bytes.len() as u64,
            missing_cells: stats.missing_cells,
            unknown_types: stats.unknown_types,
            duration_seconds: start.elapsed().as_secs_f64(),
        };
        debug!("{:?}", result);
        Ok(result)
    }

    /// Resolve the output file path, creating its directory when needed.
    pub fn output_path(&self, input: &Path, outdir: Option<&Path>) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .ok_or_else(|| ExportError::Config(format!("invalid input path {}", input.display())))?;

        let dir = match outdir.or(self.config.output.dir.as_deref()) {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                dir.to_path_buf()
            }
            None => match input.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };

        let mut file_name = stem.to_os_string();
        file_name.push(".xml");
        Ok(dir.join(file_name))
    }
}

impl ExportResult {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Output size in KB, or MB from 1 MiB upwards.
    pub fn size_display(&self) -> String {
        format_size(self.bytes)
    }
}

/// Format a byte count as "12.3 KB" or "4.5 MB".
pub fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

fn source_name(input: &Path) -> String {
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_next_to_input() {
        let exporter = Exporter::new(Config::default());
        let path = exporter
            .output_path(Path::new("/data/shop.fdb"), None)
            .unwrap();
        assert_eq!(path, PathBuf::from("/data/shop.xml"));

        let path = exporter.output_path(Path::new("shop.fdb"), None).unwrap();
        assert_eq!(path, PathBuf::from("./shop.xml"));
    }

    #[test]
    fn test_output_path_outdir_overrides_config() {
        let tmp = TempDir::new().unwrap();
        let configured = tmp.path().join("configured");
        let explicit = tmp.path().join("explicit").join("nested");

        let mut config = Config::default();
        config.output.dir = Some(configured.clone());
        let exporter = Exporter::new(config);

        let path = exporter
            .output_path(Path::new("/data/shop.fdb"), Some(&explicit))
            .unwrap();
        assert_eq!(path, explicit.join("shop.xml"));
        assert!(explicit.is_dir());

        let path = exporter.output_path(Path::new("/data/shop.fdb"), None).unwrap();
        assert_eq!(path, configured.join("shop.xml"));
    }

    #[test]
    fn test_missing_input() {
        let exporter = Exporter::new(Config::default());
        let err = exporter
            .run(Path::new("/does/not/exist.fdb"), None)
            .unwrap_err();
        assert!(matches!(err, ExportError::InputNotFound(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "0.5 KB");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_now_has_second_precision() {
        assert_eq!(now_seconds().nanosecond(), 0);
    }
}
