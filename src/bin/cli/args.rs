//! CLI argument structures.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

use duckycoder::core::config::ExportFormat;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Multi-stage content pipeline: ingest, deduplicate, analyze, enhance, report
#[derive(Parser)]
#[command(name = "duckycoder")]
#[command(version = VERSION)]
#[command(about = "DuckyCoder - content pipeline for code analysis and enhancement")]
#[command(long_about = "
Ingest files, directories or raw snippets, collapse near-duplicates, run
analyzers and enhancers, and export a composed report.

Common Usage:

  # Process a single file
  duckycoder process my_script.py

  # Process multiple files and export HTML and JSON
  duckycoder process src/*.py --export html json

  # Process a directory with UI analysis
  duckycoder process my_project/ --ui-analysis --export markdown

  # Run a single mode and print its JSON result
  duckycoder process code.js --debug --mode analyze_only
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process input files, directories or raw content
    Process(ProcessArgs),

    /// Show version information
    Version,

    /// Configuration management
    Config(ConfigArgs),
}

/// Arguments for `process`
#[derive(Args)]
pub struct ProcessArgs {
    /// Input files, directories or raw content
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Operational mode; anything but full_pipeline prints the mode result as JSON
    #[arg(long, default_value = "full_pipeline")]
    pub mode: String,

    /// Export formats (markdown, html, json, yaml, pdf, sarif, zip)
    #[arg(long, num_args = 1.., value_delimiter = ',', value_parser = parse_export_format)]
    pub export: Vec<ExportFormat>,

    /// Configuration file path
    #[arg(long, env = "DUCKYCODER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output directory for exported reports
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Force UI mockup generation
    #[arg(long)]
    pub ui_analysis: bool,

    /// Suppress the progress spinner and summary tables
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for `config`
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,

    /// Configuration file path (defaults to ./duckycoder_config.yaml)
    #[arg(long, global = true, env = "DUCKYCODER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a configuration file; exits 1 when invalid
    Validate,

    /// Print the effective configuration
    Show {
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: ShowFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ShowFormat {
    Json,
    Yaml,
}

fn parse_export_format(value: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_str(value).map_err(|e| e.to_string())
}
