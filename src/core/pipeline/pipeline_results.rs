//! Result types produced by a pipeline run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::config::ExportFormat;
use crate::core::record::{mean_confidence, CanonicalRecord, Enhancement, Finding, Severity};
use crate::detectors::graph::DependencyGraph;
use crate::detectors::rules::security::ComplianceCheck;
use crate::detectors::rules::ComplexityMetrics;
use crate::ingest::IngestFailure;
use crate::render::mockup::Mockup;
use crate::render::optimize::PerformanceReport;

/// Stage names in execution order.
pub mod stage {
    /// Read and decode inputs
    pub const INGEST: &str = "ingest";
    /// Deduplicate and build the dependency graph
    pub const MERGE: &str = "merge";
    /// Run analyzers
    pub const ANALYZE: &str = "analyze";
    /// Run enhancers
    pub const ENHANCE: &str = "enhance";
    /// Draw UI mockups
    pub const RENDER_UI: &str = "render_ui";
    /// Performance heuristics
    pub const OPTIMIZE: &str = "optimize";
    /// Aggregate security findings
    pub const SECURITY: &str = "security";
    /// Completeness and quality checks
    pub const VALIDATE: &str = "validate";
    /// Write report artifacts
    pub const EXPORT: &str = "export";
}

/// Outcome of one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageResult {
    /// Stage name, one of the [`stage`] constants
    pub stage_name: String,
    /// Whether the stage finished
    pub success: bool,
    /// Stage summary, present on success
    pub data: Option<serde_json::Value>,
    /// Error description, present on failure
    pub error: Option<String>,
    /// Wall-clock duration
    pub duration_ms: u64,
}

impl StageResult {
    /// Successful stage with a summary payload.
    pub fn succeeded(stage_name: &str, data: serde_json::Value, duration_ms: u64) -> Self {
        Self {
            stage_name: stage_name.to_string(),
            success: true,
            data: Some(data),
            error: None,
            duration_ms,
        }
    }

    /// Failed stage.
    pub fn failed(stage_name: &str, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            stage_name: stage_name.to_string(),
            success: false,
            data: None,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every stage ran; per-item failures are recorded, not fatal
    Completed,
    /// A structural error stopped the run
    Failed,
    /// Export was skipped on request
    Partial,
}

impl RunStatus {
    /// Lower-case label
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Partial => "partial",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analyzer output for one canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordAnalysis {
    /// Canonical record identity
    pub identity: String,
    /// Record language
    pub language: Option<String>,
    /// Findings from every analyzer that succeeded, sorted by line
    pub findings: Vec<Finding>,
    /// Complexity measurements for code records
    pub metrics: Option<ComplexityMetrics>,
    /// Mean finding confidence; 0 with no findings or when any analyzer failed
    pub confidence: f64,
    /// One annotation per failed analyzer
    pub errors: Vec<String>,
}

impl RecordAnalysis {
    /// True when every analyzer succeeded.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Enhancer output for one canonical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordEnhancement {
    /// Canonical record identity
    pub identity: String,
    /// Enhancements that passed the confidence filter
    pub enhancements: Vec<Enhancement>,
    /// Text with enhancements applied, when application is enabled
    pub enhanced_text: Option<String>,
    /// Enhancements applied to `enhanced_text`
    pub applied: usize,
    /// Mean confidence over every proposal; 0 when nothing was proposed or on failure
    pub confidence: f64,
    /// One annotation per failed enhancer
    pub errors: Vec<String>,
}

/// A security finding tied to its record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vulnerability {
    /// Record identity
    pub identity: String,
    /// The finding
    pub finding: Finding,
}

/// Aggregate of the security scan stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SecuritySummary {
    /// All security findings across records
    pub vulnerabilities: Vec<Vulnerability>,
    /// 100 minus severity penalties, floored at 0
    pub security_score: u32,
    /// `low`, `medium`, `high` or `critical`
    pub risk_level: String,
    /// Standards checked against the records
    pub compliance: Vec<ComplianceCheck>,
}

/// Issues recorded by the validation stage. Issues never fail a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationReport {
    /// Human-readable issue lines
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// True when no issue was recorded.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Result of writing one export format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportOutcome {
    /// Requested format
    pub format: ExportFormat,
    /// Written file on success
    pub path: Option<PathBuf>,
    /// Error description on failure
    pub error: Option<String>,
}

impl ExportOutcome {
    /// Written artifact.
    pub fn written(format: ExportFormat, path: PathBuf) -> Self {
        Self {
            format,
            path: Some(path),
            error: None,
        }
    }

    /// Failed artifact.
    pub fn failed(format: ExportFormat, error: impl Into<String>) -> Self {
        Self {
            format,
            path: None,
            error: Some(error.into()),
        }
    }

    /// True when the file was written.
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counts shown in summaries and reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Records produced by ingestion
    pub records_ingested: usize,
    /// Canonical records after deduplication
    pub canonical_records: usize,
    /// Records collapsed into another
    pub duplicates_collapsed: usize,
    /// Inputs that failed to ingest
    pub ingest_failures: usize,
    /// Findings across records
    pub total_findings: usize,
    /// Findings per severity label
    pub findings_by_severity: IndexMap<String, usize>,
    /// Enhancements kept after filtering
    pub total_enhancements: usize,
    /// Validation issues
    pub validation_issues: usize,
    /// Mean analysis confidence
    pub confidence: f64,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Random run identifier
    pub run_id: Uuid,
    /// Stage results in execution order
    pub stages: Vec<StageResult>,
    /// Final status
    pub status: RunStatus,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Finish time
    pub finished_at: DateTime<Utc>,
    /// Inputs as supplied
    pub inputs: Vec<String>,
    /// Inputs that failed to ingest
    pub ingest_failures: Vec<IngestFailure>,
    /// Records produced by ingestion, before merging
    pub records_ingested: usize,
    /// Deduplicated records
    pub canonical: Vec<CanonicalRecord>,
    /// Dependencies between canonical records
    pub graph: DependencyGraph,
    /// One entry per canonical record, same order
    pub analyses: Vec<RecordAnalysis>,
    /// One entry per canonical record, same order
    pub enhancements: Vec<RecordEnhancement>,
    /// UI mockups, when rendered
    pub mockups: Vec<Mockup>,
    /// Performance reports, when the optimize stage ran
    pub performance: Vec<PerformanceReport>,
    /// Security aggregate, when the scan ran
    pub security: Option<SecuritySummary>,
    /// Validation issues
    pub validation: ValidationReport,
    /// Per-format export results
    pub exports: Vec<ExportOutcome>,
    /// Mean analysis confidence across records
    pub confidence: f64,
    /// Structural error that failed the run
    pub error: Option<String>,
}

impl PipelineRun {
    /// Empty run started now.
    pub fn start(inputs: &[String]) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            stages: Vec::new(),
            status: RunStatus::Completed,
            started_at: now,
            finished_at: now,
            inputs: inputs.to_vec(),
            ingest_failures: Vec::new(),
            records_ingested: 0,
            canonical: Vec::new(),
            graph: DependencyGraph::default(),
            analyses: Vec::new(),
            enhancements: Vec::new(),
            mockups: Vec::new(),
            performance: Vec::new(),
            security: None,
            validation: ValidationReport::default(),
            exports: Vec::new(),
            confidence: 0.0,
            error: None,
        }
    }

    /// Result of the named stage, if it ran.
    pub fn stage(&self, name: &str) -> Option<&StageResult> {
        self.stages.iter().find(|stage| stage.stage_name == name)
    }

    /// All findings with their record identity, in record order.
    pub fn findings(&self) -> impl Iterator<Item = (&str, &Finding)> {
        self.analyses.iter().flat_map(|analysis| {
            analysis
                .findings
                .iter()
                .map(move |finding| (analysis.identity.as_str(), finding))
        })
    }

    /// Total run duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Headline counts.
    pub fn summary(&self) -> RunSummary {
        let mut findings_by_severity: IndexMap<String, usize> = Severity::ALL
            .iter()
            .rev()
            .map(|severity| (severity.as_str().to_string(), 0))
            .collect();
        let mut total_findings = 0;
        for (_, finding) in self.findings() {
            total_findings += 1;
            *findings_by_severity
                .entry(finding.severity.as_str().to_string())
                .or_default() += 1;
        }

        RunSummary {
            records_ingested: self.records_ingested,
            canonical_records: self.canonical.len(),
            duplicates_collapsed: self.records_ingested.saturating_sub(self.canonical.len()),
            ingest_failures: self.ingest_failures.len(),
            total_findings,
            findings_by_severity,
            total_enhancements: self
                .enhancements
                .iter()
                .map(|entry| entry.enhancements.len())
                .sum(),
            validation_issues: self.validation.issues.len(),
            confidence: mean_confidence(self.analyses.iter().map(|analysis| analysis.confidence)),
        }
    }
}
