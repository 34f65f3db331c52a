//! DuckyCoder CLI
//!
//! `process` runs the content pipeline (or a single mode), `version` prints
//! the version and `config` manages configuration files.

use std::process::ExitCode;

use clap::Parser;

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process(args) => cli::process_command(args).await,
        Commands::Version => {
            cli::version_command();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(args) => cli::config_command(args).await,
    }
}
