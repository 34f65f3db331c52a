//! Configuration management commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};

use duckycoder::core::config::{read_document, validate_document, DuckyConfig, DEFAULT_CONFIG_FILE};

use crate::cli::args::{ConfigAction, ConfigArgs, ShowFormat};
use crate::cli::logging::init_tracing;

/// Dispatch a `config` action.
pub async fn config_command(args: ConfigArgs) -> anyhow::Result<ExitCode> {
    init_tracing(&DuckyConfig::default().logging, false);
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match args.action {
        ConfigAction::Init { force } => init_config(&path, force).await,
        ConfigAction::Validate => Ok(validate_config(&path)),
        ConfigAction::Show { format } => show_config(args.config.as_deref(), format),
    }
}

/// Write the default configuration to `path`.
async fn init_config(path: &Path, force: bool) -> anyhow::Result<ExitCode> {
    if path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Configuration file already exists: {}. Use --force to overwrite",
            path.display()
        ));
    }

    DuckyConfig::default().to_file(path)?;

    println!(
        "{} {}",
        "Default configuration created:".bright_green().bold(),
        path.display().to_string().cyan()
    );
    println!();

    #[derive(Tabled)]
    struct CustomizationRow {
        setting: &'static str,
        description: &'static str,
    }

    let rows = vec![
        CustomizationRow {
            setting: "modes.<name>.enabled",
            description: "Enable or disable an operational mode",
        },
        CustomizationRow {
            setting: "export_config.default_formats",
            description: "Formats written when --export is not given",
        },
        CustomizationRow {
            setting: "dedupe.similarity_threshold",
            description: "Similarity above which records collapse (default: 0.85)",
        },
        CustomizationRow {
            setting: "enhancement.confidence_threshold",
            description: "Minimum confidence for a proposed enhancement (default: 0.7)",
        },
        CustomizationRow {
            setting: "pipeline.evaluator_timeout_ms",
            description: "Optional per-evaluator time budget",
        },
    ];
    let mut table = Table::new(rows);
    table.with(TableStyle::rounded());
    println!("{table}");

    Ok(ExitCode::SUCCESS)
}

/// Check the raw document structure, then the merged typed configuration.
fn validate_config(path: &Path) -> ExitCode {
    let checked = read_document(path).and_then(|document| {
        validate_document(&document)?;
        DuckyConfig::from_document(document)
    });

    match checked {
        Ok(_) => {
            println!(
                "{} {}",
                "Configuration valid:".bright_green().bold(),
                path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {}", "Configuration validation failed:".red().bold(), e);
            eprintln!("   - Check YAML syntax (indentation, colons, quotes)");
            eprintln!("   - Verify all required sections are present");
            eprintln!("   - Run 'duckycoder config init' to see a valid file");
            ExitCode::FAILURE
        }
    }
}

/// Print the effective configuration.
fn show_config(path: Option<&Path>, format: ShowFormat) -> anyhow::Result<ExitCode> {
    let config = DuckyConfig::load(path)?;
    let rendered = match format {
        ShowFormat::Json => serde_json::to_string_pretty(&config)?,
        ShowFormat::Yaml => serde_yaml::to_string(&config)?,
    };
    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}
