//! fdb2xml CLI - Firebird .fdb to flat XML.

use clap::Parser;
use fdb2xml::{Config, ExportError, Exporter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "fdb2xml")]
#[command(about = "Export a Firebird database to one flat XML document")]
#[command(version)]
struct Cli {
    /// Path to the .fdb file (or a .json snapshot)
    input: PathBuf,

    /// Output directory (default: same as the input)
    #[arg(short, long)]
    outdir: Option<PathBuf>,

    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<(), ExportError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(ExportError::Config)?;

    let config = match cli.config {
        Some(ref path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    let result = Exporter::new(config).run(&cli.input, cli.outdir.as_deref())?;

    if cli.output_json {
        println!("{}", result.to_json()?);
    } else {
        println!("{} elements -> {}", result.elements, result.output.display());
        println!("  Tables: {}", result.tables);
        println!("  Rows: {}", result.rows);
        if result.missing_cells > 0 {
            println!("  Missing cells (written as NULL): {}", result.missing_cells);
        }
        println!("  Duration: {:.2}s", result.duration_seconds);
        println!(
            "Done! {} ({})",
            result.output.display(),
            result.size_display()
        );
    }

    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
