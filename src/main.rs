//! Main entry point for the kepubify CLI application.
//!
//! Converts each EPUB named on the command line (or found in a named
//! directory) into a kepub, one book at a time.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

use kepubify::cli::{is_epub, is_kepub};
use kepubify::{Cli, Converter, LogProgress};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let inputs = collect_inputs(&cli.files).await?;
    if inputs.is_empty() {
        bail!("no epub files found");
    }

    if let Some(dir) = &cli.output_dir {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("could not create {}", dir.display()))?;
    }

    let mut converter = Converter::new(cli.options());
    if !cli.is_quiet() {
        converter = converter.with_progress(LogProgress);
    }

    let mut failed = 0usize;
    for input in &inputs {
        let output = cli.output_path(input);

        // Handle existing files based on overwrite options
        if !cli.overwrite && fs::try_exists(&output).await.unwrap_or(false) {
            if cli.never_overwrite {
                debug!(output = %output.display(), "skipping existing output");
            } else {
                warn!("Skipping: {} (use -o to overwrite)", output.display());
            }
            continue;
        }

        match converter.convert(input, &output).await {
            Ok(()) => {
                if !cli.is_quiet() {
                    println!("  converted: {} -> {}", input.display(), output.display());
                }
            }
            Err(err) => {
                failed += 1;
                error!(input = %input.display(), stage = %err.stage(), "{err}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} conversions failed", inputs.len());
    }
    Ok(())
}

/// Install the `tracing` subscriber; `RUST_LOG` overrides the `-q`/`-v` level.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Expand the positional arguments into the list of books to convert.
///
/// Files are taken as given. A directory contributes the EPUBs directly inside
/// it, in name order, except those already converted.
async fn collect_inputs(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for arg in args {
        let metadata = fs::metadata(arg)
            .await
            .with_context(|| format!("{} does not exist", arg.display()))?;

        if !metadata.is_dir() {
            inputs.push(arg.clone());
            continue;
        }

        let mut found = Vec::new();
        let mut entries = fs::read_dir(arg)
            .await
            .with_context(|| format!("could not read {}", arg.display()))?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if is_epub(&path) && !is_kepub(&path) && entry.file_type().await?.is_file() {
                found.push(path);
            }
        }
        found.sort();
        debug!(dir = %arg.display(), books = found.len(), "scanned directory");
        inputs.extend(found);
    }

    Ok(inputs)
}
