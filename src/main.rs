//! Relieur CLI
//!
//! ```bash
//! relieur page
//! relieur page2 page3 page1
//! relieur page -o mymusicscore.musicxml
//! relieur "scans/*.musicxml" --debug --json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

use relieur::{merge_tokens, output_path, write_score, MergeReport, MergeSettings};

/// Top-level CLI entry point for the `relieur` binary.
#[derive(Parser)]
#[command(
    name = "relieur",
    version,
    about = "A small tool to merge multiple MusicXML files in a unique one",
    long_about = "Merge multiple MusicXML files in a unique one.\n\
                  Provide a list of files, glob patterns, or a radical which is a common\n\
                  starting part of the file names (expanded to <radical>*.musicxml).\n\
                  Files are merged in sorted name order."
)]
struct Cli {
    /// Files, glob patterns, or radicals to merge.
    concat: Vec<String>,

    /// File name of output (extension forced to .musicxml).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug output.
    #[arg(short, long)]
    debug: bool,

    /// JSON settings file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the merge report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    report: &'a MergeReport,
    output: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if cli.concat.is_empty() {
        eprintln!("No files list provided nor radical");
        if let Err(err) = Cli::command().print_help() {
            log::warn!("Cannot print help: {}", err);
        }
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let level = if debug { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<()> {
    let settings = match &cli.config {
        Some(path) => MergeSettings::from_json_file(path)?,
        None => MergeSettings::default(),
    };

    let outcome = merge_tokens(cli.concat.as_slice(), &settings).context("merge failed")?;

    let path = output_path(cli.output.as_deref());
    let written = write_score(&outcome.document, &path, settings.indent)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if cli.json {
        let summary = Summary {
            report: &outcome.report,
            output: written.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Processed {} files, getting {} measures",
            outcome.files(),
            outcome.measures()
        );
        println!("Result is in {}", written.display());
    }
    Ok(())
}
