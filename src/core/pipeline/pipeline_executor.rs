//! Pipeline executor that sequences the stages of one run.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use crate::core::config::{DuckyConfig, ExportFormat};
use crate::core::errors::{DuckyError, Result};
use crate::core::record::mean_confidence;
use crate::detectors::dedupe::DeduplicatingMerger;
use crate::detectors::graph::DependencyGraph;
use crate::detectors::rules::security::ComplianceChecker;
use crate::detectors::rules::RuleRegistry;
use crate::io::reports::{ReportDocument, ReportExporter};
use crate::render::mockup::MockupRenderer;
use crate::render::optimize::PerformanceAnalyzer;

use super::pipeline_results::{stage, PipelineRun, RunStatus, StageResult};
use super::pipeline_stages::{summarize_security, validate_run, PipelineStages};
use super::services::{default_source, ArtifactExporter, RecordSource};

/// Progress callback function type
pub type ProgressCallback = Box<dyn Fn(&str, f64) + Send + Sync>;

/// Per-run switches supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Formats to export; empty means the configured defaults
    pub formats: Vec<ExportFormat>,
    /// Output directory; `None` means the configured directory
    pub output_dir: Option<PathBuf>,
    /// Stop after validation and mark the run partial
    pub skip_export: bool,
    /// Force the UI render stage
    pub ui_analysis: bool,
}

/// Runs ingest, merge, analyze, enhance, the optional render, optimize and
/// security stages, validation and export, in that order.
pub struct ContentPipeline {
    config: Arc<DuckyConfig>,
    source: Arc<dyn RecordSource>,
    exporter: Arc<dyn ArtifactExporter>,
    stages: PipelineStages,
    merger: DeduplicatingMerger,
    mockups: MockupRenderer,
    performance: PerformanceAnalyzer,
    compliance: ComplianceChecker,
    progress_callback: Option<ProgressCallback>,
}

impl ContentPipeline {
    /// Create a pipeline with the default evaluators, file-system ingestion
    /// and report exporter.
    pub fn new(config: DuckyConfig) -> Result<Self> {
        let registry = RuleRegistry::with_defaults(&config)?;
        let source = default_source(&config)?;

        Ok(Self {
            stages: PipelineStages::new(registry, &config),
            merger: DeduplicatingMerger::new(&config.dedupe)?,
            mockups: MockupRenderer::new(config.ui_mockup.width)?,
            performance: PerformanceAnalyzer::new()?,
            compliance: ComplianceChecker::new()?,
            exporter: ReportExporter::shared(),
            source,
            config: Arc::new(config),
            progress_callback: None,
        })
    }

    /// Replace the analyzers and enhancers.
    pub fn with_registry(mut self, registry: RuleRegistry) -> Self {
        self.stages = PipelineStages::new(registry, &self.config);
        self
    }

    /// Replace the record source.
    pub fn with_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = source;
        self
    }

    /// Replace the artifact exporter.
    pub fn with_exporter(mut self, exporter: Arc<dyn ArtifactExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    /// Report stage progress as `(stage name, fraction done)`.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &DuckyConfig {
        &self.config
    }

    /// Execute one run. Never returns an error: a structural failure is
    /// recorded on the run with status `failed`.
    pub async fn run(&self, inputs: &[String], options: &RunOptions) -> PipelineRun {
        let mut run = PipelineRun::start(inputs);
        info!("Starting pipeline run {} over {} input(s)", run.run_id, inputs.len());

        if let Err(e) = self.execute(&mut run, options).await {
            error!("Pipeline run {} failed: {}", run.run_id, e);
            run.status = RunStatus::Failed;
            run.error = Some(e.to_string());
        }

        run.finished_at = Utc::now();
        info!(
            "Pipeline run {} finished as {} in {}ms",
            run.run_id,
            run.status,
            run.duration_ms()
        );
        run
    }

    async fn execute(&self, run: &mut PipelineRun, options: &RunOptions) -> Result<()> {
        // Ingest
        self.progress(stage::INGEST, 0.0);
        let started = Instant::now();
        let outcome = match self.source.ingest(&run.inputs).await {
            Ok(outcome) => outcome,
            Err(e) => {
                run.stages
                    .push(StageResult::failed(stage::INGEST, e.to_string(), elapsed(started)));
                return Err(DuckyError::pipeline(stage::INGEST, e.to_string()));
            }
        };
        for failure in &outcome.failures {
            warn!("Ingestion failed for {}: {}", failure.input, failure.message);
        }
        run.records_ingested = outcome.records.len();
        run.ingest_failures = outcome.failures;
        run.stages.push(StageResult::succeeded(
            stage::INGEST,
            json!({
                "records": run.records_ingested,
                "failures": run.ingest_failures.len(),
            }),
            elapsed(started),
        ));

        // Merge
        self.progress(stage::MERGE, 0.15);
        let started = Instant::now();
        let (canonical, stats) = self.merger.merge_with_stats(&outcome.records);
        run.graph =
            DependencyGraph::build(&canonical, self.config.input_config.cross_language_deps);
        run.canonical = canonical;
        info!(
            "Merged {} records into {} canonical records",
            stats.input_records,
            run.canonical.len()
        );
        run.stages.push(StageResult::succeeded(
            stage::MERGE,
            json!({
                "canonical_records": run.canonical.len(),
                "groups": stats.groups,
                "comparisons": stats.comparisons,
                "duplicates_collapsed": stats.duplicates_collapsed,
                "dependency_edges": run.graph.edges.len(),
            }),
            elapsed(started),
        ));

        // Analyze
        self.progress(stage::ANALYZE, 0.3);
        let started = Instant::now();
        run.analyses = self.stages.analyze(&run.canonical).await;
        run.confidence = mean_confidence(run.analyses.iter().map(|analysis| analysis.confidence));
        run.stages.push(StageResult::succeeded(
            stage::ANALYZE,
            json!({
                "records": run.analyses.len(),
                "findings": run.analyses.iter().map(|a| a.findings.len()).sum::<usize>(),
                "failed_records": run.analyses.iter().filter(|a| !a.is_complete()).count(),
                "confidence": run.confidence,
            }),
            elapsed(started),
        ));

        // Enhance
        self.progress(stage::ENHANCE, 0.45);
        let started = Instant::now();
        run.enhancements = self.stages.enhance(&run.canonical, &run.analyses).await;
        run.stages.push(StageResult::succeeded(
            stage::ENHANCE,
            json!({
                "enhancements": run.enhancements.iter().map(|e| e.enhancements.len()).sum::<usize>(),
                "applied": run.enhancements.iter().map(|e| e.applied).sum::<usize>(),
                "confidence": mean_confidence(run.enhancements.iter().map(|e| e.confidence)),
            }),
            elapsed(started),
        ));

        // Render UI
        if options.ui_analysis || self.config.ui_mockup.enabled {
            self.progress(stage::RENDER_UI, 0.55);
            let started = Instant::now();
            run.mockups = run
                .canonical
                .iter()
                .filter_map(|canonical| self.mockups.render(&canonical.representative))
                .collect();
            if options.ui_analysis || !run.mockups.is_empty() {
                run.stages.push(StageResult::succeeded(
                    stage::RENDER_UI,
                    json!({ "mockups": run.mockups.len() }),
                    elapsed(started),
                ));
            }
        }

        // Optimize
        if self.config.performance_monitoring.enabled {
            self.progress(stage::OPTIMIZE, 0.65);
            let started = Instant::now();
            run.performance = run
                .canonical
                .iter()
                .filter(|canonical| canonical.representative.category.is_code())
                .map(|canonical| self.performance.analyze(&canonical.representative))
                .collect();
            run.stages.push(StageResult::succeeded(
                stage::OPTIMIZE,
                json!({ "reports": run.performance.len() }),
                elapsed(started),
            ));
        }

        // Security scan
        if self.config.security_config.enable_scanning {
            self.progress(stage::SECURITY, 0.75);
            let started = Instant::now();
            let summary = summarize_security(
                &run.canonical,
                &run.analyses,
                &self.config.security_config.compliance_standards,
                &self.compliance,
            );
            run.stages.push(StageResult::succeeded(
                stage::SECURITY,
                json!({
                    "vulnerabilities": summary.vulnerabilities.len(),
                    "security_score": summary.security_score,
                    "risk_level": summary.risk_level,
                }),
                elapsed(started),
            ));
            run.security = Some(summary);
        }

        // Validate
        self.progress(stage::VALIDATE, 0.85);
        let started = Instant::now();
        run.validation = validate_run(
            &run.ingest_failures,
            &run.canonical,
            &run.analyses,
            &run.enhancements,
            self.config.enhancement.confidence_threshold,
        );
        let draft = ReportDocument::compose(run);
        run.validation.issues.extend(
            draft
                .missing_sections()
                .into_iter()
                .map(|section| format!("Missing output section: {section}")),
        );
        if !run.validation.is_clean() {
            warn!("Validation recorded {} issue(s)", run.validation.issues.len());
        }
        run.stages.push(StageResult::succeeded(
            stage::VALIDATE,
            json!({ "issues": run.validation.issues.len() }),
            elapsed(started),
        ));

        // Export
        if options.skip_export {
            info!("Export skipped; run {} is partial", run.run_id);
            run.status = RunStatus::Partial;
            self.progress(stage::EXPORT, 1.0);
            return Ok(());
        }

        self.progress(stage::EXPORT, 0.95);
        let started = Instant::now();
        let formats = if options.formats.is_empty() {
            self.config.export_config.default_formats.clone()
        } else {
            options.formats.clone()
        };
        let output_dir = options
            .output_dir
            .clone()
            .unwrap_or_else(|| self.config.export_config.output_directory.clone());

        run.finished_at = Utc::now();
        let exports = self.exporter.export(run, &formats, &output_dir);
        let failed: Vec<String> = exports
            .iter()
            .filter_map(|outcome| {
                outcome
                    .error
                    .as_ref()
                    .map(|error| format!("{}: {}", outcome.format, error))
            })
            .collect();
        let written = exports.len() - failed.len();
        run.exports = exports;

        let result = if failed.is_empty() {
            StageResult::succeeded(stage::EXPORT, json!({ "written": written }), elapsed(started))
        } else {
            warn!("{} export format(s) failed", failed.len());
            StageResult::failed(stage::EXPORT, failed.join("; "), elapsed(started))
        };
        run.stages.push(result);
        self.progress(stage::EXPORT, 1.0);

        Ok(())
    }

    fn progress(&self, stage_name: &str, fraction: f64) {
        if let Some(callback) = &self.progress_callback {
            callback(stage_name, fraction);
        }
    }
}

fn elapsed(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "pipeline_executor_tests.rs"]
mod tests;
