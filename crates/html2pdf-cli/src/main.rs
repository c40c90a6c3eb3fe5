use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use html2pdf::config::{CancelFlag, ConvertOptions};
use html2pdf::error::ConvertError;
use html2pdf::render::Engine;

const EXAMPLES: &str = "\
Examples:
  html2pdf input.html                      # Creates input.pdf in same directory
  html2pdf input.html -o output.pdf        # Creates output.pdf
  html2pdf input.html -o /path/to/doc.pdf  # Creates doc.pdf at specified path

The rendering engine is located on PATH (weasyprint, wkhtmltopdf, chromium).
Set HTML2PDF_ENGINE to an engine name or executable path to choose one.";

#[derive(Parser)]
#[command(
    name = "html2pdf",
    version,
    about = "Convert HTML files to PDF while preserving formatting",
    after_help = EXAMPLES
)]
struct Cli {
    /// Input HTML file path (.html, .htm)
    input: PathBuf,

    /// Output PDF file path (default: input with .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a status line before converting
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    env_logger::init();

    // Fail fast, before any argument handling, when nothing can render.
    let engine = match Engine::detect() {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };

    let cli = Cli::parse();

    if let Err(err) = run(cli, &engine) {
        eprintln!("{}", error_line(&err));
        process::exit(1);
    }
}

fn run(cli: Cli, engine: &Engine) -> Result<()> {
    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || on_interrupt.cancel())
        .context("failed to install interrupt handler")?;

    if cli.verbose {
        println!("Converting {} to PDF...", cli.input.display());
    }

    let options = ConvertOptions {
        output: cli.output,
        cancel,
    };
    let result = html2pdf::convert_with(engine, &cli.input, &options)?;

    for warning in &result.warnings {
        eprintln!("Warning: {warning}");
    }

    println!("Successfully converted to: {}", result.output.display());
    Ok(())
}

/// The single line reported on stderr for a failed run.
fn error_line(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ConvertError>() {
        Some(ConvertError::Interrupted) => "\nOperation cancelled by user".to_string(),
        Some(err) => format!("Error: {err}"),
        None => format!("Unexpected error: {err:#}"),
    }
}
