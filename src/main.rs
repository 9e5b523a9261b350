//! richstyle - Main Entry Point
//!
//! Decodes a markup file with the configured style vocabulary and prints its
//! canonical re-encoding.

use clap::Parser;
use log::{error, info};
use richstyle::buffer::StyledBufferController;
use richstyle::config::{load_config, load_config_from};
use richstyle::error::Result;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "richstyle")]
#[command(about = "Normalise rich-text style markup")]
#[command(version)]
struct Cli {
    /// Style configuration (JSON or TOML); the user config if omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wrap the output in the configured root tag
    #[arg(long)]
    document: bool,

    /// Markup file to read
    file: PathBuf,
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(markup) => {
            println!("{}", markup);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let settings = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config(),
    };
    info!(
        "Using {} styles (default '{}')",
        settings.styles.len(),
        settings.default_key
    );

    let source = fs::read_to_string(&cli.file)?;
    let mut controller = StyledBufferController::from_settings(&settings);
    controller.import_markup(&source)?;

    let buffer = controller.buffer();
    info!(
        "{}: {} chars in {} runs across {} paragraphs",
        cli.file.display(),
        buffer.len(),
        buffer.runs().len(),
        buffer.paragraphs().len()
    );

    Ok(if cli.document {
        controller.export_document()
    } else {
        controller.export_markup(None)
    })
}
