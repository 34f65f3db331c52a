//! `process`: full pipeline runs and single-mode dispatch.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tracing::{info, warn};

use duckycoder::core::config::DuckyConfig;
use duckycoder::core::pipeline::{ContentPipeline, PipelineRun, ProgressCallback, RunOptions, RunStatus};
use duckycoder::ingest::Ingestor;
use duckycoder::modes::{ModeContext, ModeDispatcher};

use crate::cli::args::ProcessArgs;
use crate::cli::logging::init_tracing;

const FULL_PIPELINE: &str = "full_pipeline";

/// Run `process`; the exit code is success only for a completed run or a
/// successful mode.
pub async fn process_command(args: ProcessArgs) -> anyhow::Result<ExitCode> {
    let mut config = DuckyConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging, args.debug);

    if args.ui_analysis {
        config.ui_mockup.enabled = true;
    }

    if args.mode == FULL_PIPELINE {
        run_pipeline(args, config).await
    } else {
        run_mode(args, config).await
    }
}

fn spinner(quiet: bool) -> ProgressBar {
    if quiet || !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn run_pipeline(args: ProcessArgs, config: DuckyConfig) -> anyhow::Result<ExitCode> {
    let pb = spinner(args.quiet);
    pb.set_message("Starting pipeline");

    let progress: ProgressCallback = Box::new({
        let pb = pb.clone();
        move |stage: &str, fraction: f64| {
            pb.set_message(format!("{stage} ({:.0}%)", fraction * 100.0));
        }
    });

    let pipeline = ContentPipeline::new(config)
        .context("Failed to initialise pipeline")?
        .with_progress_callback(progress);
    let options = RunOptions {
        formats: args.export.clone(),
        output_dir: args.output_dir.clone(),
        skip_export: false,
        ui_analysis: args.ui_analysis,
    };

    info!("Processing {} input(s)", args.inputs.len());
    let run = pipeline.run(&args.inputs, &options).await;
    pb.finish_and_clear();

    print_run(&run, args.quiet);

    Ok(if run.status == RunStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run_mode(args: ProcessArgs, config: DuckyConfig) -> anyhow::Result<ExitCode> {
    let ingestor = Ingestor::new(&config).context("Failed to initialise ingestion")?;
    let outcome = ingestor.ingest(&args.inputs).await;
    for failure in &outcome.failures {
        warn!("Skipping {}: {}", failure.input, failure.message);
        if !args.quiet {
            eprintln!("{} {}: {}", "Skipped".yellow(), failure.input, failure.message);
        }
    }

    let config = Arc::new(config);
    let dispatcher = ModeDispatcher::new(&config);
    let ctx = ModeContext::new(outcome.records, Arc::clone(&config));
    let result = dispatcher.dispatch(&args.mode, &ctx).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    stage: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn metric(metric: &str, value: impl ToString) -> MetricRow {
    MetricRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

fn print_run(run: &PipelineRun, quiet: bool) {
    if run.status == RunStatus::Failed {
        eprintln!(
            "{} {}",
            "DuckyCoder processing failed:".red().bold(),
            run.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    println!(
        "{} {}",
        "DuckyCoder processing".bright_green().bold(),
        run.status.to_string().bright_green().bold()
    );

    if !quiet {
        let stages: Vec<StageRow> = run
            .stages
            .iter()
            .map(|stage| StageRow {
                stage: stage.stage_name.clone(),
                status: if stage.success { "ok".to_string() } else { "failed".to_string() },
                duration: format!("{} ms", stage.duration_ms),
            })
            .collect();
        let mut table = Table::new(stages);
        table.with(TableStyle::rounded());
        println!("{table}");

        let summary = run.summary();
        let mut rows = vec![
            metric("Records ingested", summary.records_ingested),
            metric("Canonical records", summary.canonical_records),
            metric("Duplicates collapsed", summary.duplicates_collapsed),
            metric("Findings", summary.total_findings),
        ];
        rows.extend(
            summary
                .findings_by_severity
                .iter()
                .map(|(severity, count)| metric(&format!("  {severity}"), count)),
        );
        rows.push(metric("Enhancements", summary.total_enhancements));
        rows.push(metric("Confidence", format!("{:.2}", summary.confidence)));
        let mut table = Table::new(rows);
        table.with(TableStyle::rounded());
        println!("{table}");
    }

    if !run.exports.is_empty() {
        println!("{}", "Exports:".bright_blue().bold());
        for export in &run.exports {
            match (&export.path, &export.error) {
                (Some(path), _) => println!("  - {}: {}", export.format.name().to_uppercase(), path.display()),
                (None, Some(error)) => println!(
                    "  - {}: {}",
                    export.format.name().to_uppercase(),
                    format!("Error: {error}").red()
                ),
                (None, None) => {}
            }
        }
    }

    if run.validation.issues.is_empty() {
        println!("{}", "All validation checks passed".bright_green());
    } else {
        println!(
            "{}",
            format!("{} validation issues found:", run.validation.issues.len()).yellow()
        );
        for issue in &run.validation.issues {
            println!("     - {issue}");
        }
    }
}
