//! copybook2json: write the JSON layout of a COBOL copybook.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result, WrapErr};

use open_mainframe_copybook::{convert, to_json, CopybookConfig};

/// Convert a COBOL copybook into a JSON record layout.
#[derive(Parser)]
#[command(name = "copybook2json", version)]
struct Cli {
    /// Copybook source file.
    file: PathBuf,

    /// Output file (default: the input path with a .json extension).
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Write the JSON to stdout instead of a file.
    #[arg(long)]
    stdout: bool,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write single-line JSON.
    #[arg(long)]
    compact: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => CopybookConfig::from_file(path)?,
        None => CopybookConfig::default(),
    };
    if cli.compact {
        config.output.pretty = false;
    }

    let source = std::fs::read_to_string(&cli.file)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read copybook: {}", cli.file.display()))?;

    tracing::info!("Converting {}", cli.file.display());
    let nodes = convert(&source, &config)
        .wrap_err_with(|| format!("Failed to convert {}", cli.file.display()))?;
    let json = to_json(&nodes, config.output.pretty)?;

    if cli.stdout {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", json).into_diagnostic()?;
        return Ok(());
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&cli.file, &config.output.extension));
    std::fs::write(&output, json + "\n")
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write layout: {}", output.display()))?;
    tracing::info!(fields = nodes.len(), "Wrote {}", output.display());

    Ok(())
}

/// The input path with its extension replaced.
fn default_output(input: &Path, extension: &str) -> PathBuf {
    input.with_extension(extension)
}
