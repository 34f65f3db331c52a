//! Report document composed from a finished pipeline run.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::pipeline::{PipelineRun, RunSummary};
use crate::core::record::{mean_confidence, Severity};

/// Headline verdict derived from the number of findings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Fewer than 10 findings
    Good,
    /// Fewer than 50 findings
    NeedsAttention,
    /// 50 findings or more
    Critical,
}

impl OverallStatus {
    /// Status for a total finding count.
    pub fn from_issue_count(total: usize) -> Self {
        if total < 10 {
            OverallStatus::Good
        } else if total < 50 {
            OverallStatus::NeedsAttention
        } else {
            OverallStatus::Critical
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            OverallStatus::Good => "Good",
            OverallStatus::NeedsAttention => "Needs Attention",
            OverallStatus::Critical => "Critical",
        }
    }
}

/// Risk line shown under the executive summary.
pub fn risk_assessment(total_findings: usize) -> &'static str {
    match total_findings {
        0 => "LOW: no issues identified",
        1..=9 => "LOW: minor issues that should be addressed",
        10..=49 => "MEDIUM: several issues requiring attention",
        _ => "HIGH: many issues requiring immediate attention",
    }
}

/// Executive summary of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutiveSummary {
    pub files_processed: usize,
    pub canonical_records: usize,
    pub total_findings: usize,
    pub total_enhancements: usize,
    pub findings_by_severity: IndexMap<String, usize>,
    pub overall_status: OverallStatus,
    pub status_label: String,
    pub risk_assessment: String,
    pub key_findings: Vec<String>,
    pub improvements: Vec<String>,
}

/// One titled block of the report.
///
/// `lines` are short human-readable entries; `blocks` are preformatted text
/// such as mockup drawings; `data` carries the structured payload for the
/// machine-readable formats.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportSection {
    pub title: String,
    pub section_type: String,
    pub priority: u8,
    pub lines: Vec<String>,
    pub blocks: Vec<String>,
    pub data: Value,
}

impl ReportSection {
    fn new(title: &str, section_type: &str, priority: u8) -> Self {
        Self {
            title: title.to_string(),
            section_type: section_type.to_string(),
            priority,
            lines: Vec::new(),
            blocks: Vec::new(),
            data: Value::Null,
        }
    }
}

/// Provenance and headline numbers for the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    pub run_id: String,
    pub version: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub input_sources: Vec<String>,
    pub languages_detected: Vec<String>,
    pub frameworks_detected: Vec<String>,
    pub analysis_confidence: f64,
    pub enhancement_confidence: f64,
    pub processing_pipeline: Vec<String>,
}

/// Section types every report must carry, besides its metadata.
pub const REQUIRED_SECTIONS: &[&str] = &["summary", "analysis", "enhancements"];

/// The composed report every export format is written from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ExecutiveSummary,
    pub sections: Vec<ReportSection>,
    pub validation: Vec<String>,
    pub metadata: ReportMetadata,
}

impl ReportDocument {
    /// Compose the report for `run`.
    pub fn compose(run: &PipelineRun) -> Self {
        let summary = executive_summary(run, &run.summary());

        let mut sections = vec![
            summary_section(&summary),
            analysis_section(run),
            enhancement_section(run),
        ];
        sections.extend(mockup_section(run));
        sections.extend(performance_section(run));
        sections.extend(security_section(run));

        Self {
            title: format!("DuckyCoder v{} Analysis Report", crate::VERSION),
            generated_at: Utc::now(),
            summary,
            sections,
            validation: run.validation.issues.clone(),
            metadata: metadata(run),
        }
    }

    /// Required parts absent from this document, by name.
    pub fn missing_sections(&self) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = REQUIRED_SECTIONS
            .iter()
            .copied()
            .filter(|required| !self.sections.iter().any(|s| s.section_type == *required))
            .collect();
        if self.metadata.run_id.is_empty() {
            missing.push("metadata");
        }
        missing
    }

    /// Flattened plain-text rendering used by the PDF writer.
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.title.clone(),
            format!("Generated {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
            String::new(),
            format!("Overall status: {}", self.summary.status_label),
            format!("Risk: {}", self.summary.risk_assessment),
        ];
        for section in &self.sections {
            lines.push(String::new());
            lines.push(section.title.to_uppercase());
            lines.extend(section.lines.iter().map(|line| format!("  {line}")));
            for block in &section.blocks {
                lines.extend(block.lines().map(|line| format!("    {line}")));
            }
        }
        if !self.validation.is_empty() {
            lines.push(String::new());
            lines.push("VALIDATION".to_string());
            lines.extend(self.validation.iter().map(|issue| format!("  {issue}")));
        }
        lines
    }
}

fn executive_summary(run: &PipelineRun, counts: &RunSummary) -> ExecutiveSummary {
    let mut key_findings: Vec<String> = run
        .analyses
        .iter()
        .filter(|analysis| {
            analysis
                .findings
                .iter()
                .any(|finding| finding.severity == Severity::Critical)
        })
        .map(|analysis| format!("Critical issues found in {}", analysis.identity))
        .collect();
    if key_findings.is_empty() {
        key_findings.push("No critical issues identified".to_string());
    }

    let mut improvements: Vec<String> = run
        .enhancements
        .iter()
        .filter(|entry| !entry.enhancements.is_empty())
        .map(|entry| {
            format!(
                "{} enhancements proposed for {} ({} applied)",
                entry.enhancements.len(),
                entry.identity,
                entry.applied
            )
        })
        .collect();
    if improvements.is_empty() {
        improvements.push("No enhancements were necessary".to_string());
    }

    let overall_status = OverallStatus::from_issue_count(counts.total_findings);
    ExecutiveSummary {
        files_processed: counts.records_ingested,
        canonical_records: counts.canonical_records,
        total_findings: counts.total_findings,
        total_enhancements: counts.total_enhancements,
        findings_by_severity: counts.findings_by_severity.clone(),
        overall_status,
        status_label: overall_status.label().to_string(),
        risk_assessment: risk_assessment(counts.total_findings).to_string(),
        key_findings,
        improvements,
    }
}

fn summary_section(summary: &ExecutiveSummary) -> ReportSection {
    let mut section = ReportSection::new("Executive Summary", "summary", 1);
    section.lines = vec![
        format!("Files processed: {}", summary.files_processed),
        format!("Canonical records: {}", summary.canonical_records),
        format!("Issues identified: {}", summary.total_findings),
        format!("Enhancements proposed: {}", summary.total_enhancements),
    ];
    section.lines.extend(summary.key_findings.iter().cloned());
    section.lines.extend(summary.improvements.iter().cloned());
    section.data = json!({
        "files_processed": summary.files_processed,
        "total_issues": summary.total_findings,
        "total_enhancements": summary.total_enhancements,
    });
    section
}

fn analysis_section(run: &PipelineRun) -> ReportSection {
    let mut section = ReportSection::new("Code Analysis Results", "analysis", 2);
    for analysis in &run.analyses {
        section.lines.push(format!(
            "{}: {} finding(s), confidence {:.2}",
            analysis.identity,
            analysis.findings.len(),
            analysis.confidence
        ));
        for finding in &analysis.findings {
            let line = finding
                .line()
                .map_or_else(String::new, |line| format!(" line {line}"));
            section.lines.push(format!(
                "[{}]{} {} ({})",
                finding.severity, line, finding.message, finding.rule_id
            ));
        }
        for error in &analysis.errors {
            section.lines.push(format!("error: {error}"));
        }
    }
    section.data = json!(run.analyses);
    section
}

fn enhancement_section(run: &PipelineRun) -> ReportSection {
    let mut section = ReportSection::new("Code Enhancements", "enhancements", 3);
    for entry in &run.enhancements {
        if entry.enhancements.is_empty() && entry.errors.is_empty() {
            continue;
        }
        section.lines.push(format!(
            "{}: {} proposed, {} applied",
            entry.identity,
            entry.enhancements.len(),
            entry.applied
        ));
        for enhancement in &entry.enhancements {
            section.lines.push(format!(
                "{} ({:.2}): {}",
                enhancement.kind.as_str(),
                enhancement.confidence,
                enhancement.description
            ));
        }
        for error in &entry.errors {
            section.lines.push(format!("error: {error}"));
        }
    }
    if section.lines.is_empty() {
        section.lines.push("No enhancements were necessary".to_string());
    }
    section.data = json!(run.enhancements);
    section
}

fn mockup_section(run: &PipelineRun) -> Option<ReportSection> {
    if run.mockups.is_empty() {
        return None;
    }
    let mut section = ReportSection::new("UI Mockups", "ui_mockups", 4);
    for mockup in &run.mockups {
        section.lines.push(format!(
            "{}: {} component(s), framework {}",
            mockup.identity,
            mockup.components.len(),
            mockup.framework.as_deref().unwrap_or("unknown")
        ));
        section.blocks.push(mockup.ascii.clone());
    }
    section.data = json!(run.mockups);
    Some(section)
}

fn performance_section(run: &PipelineRun) -> Option<ReportSection> {
    if run.performance.is_empty() {
        return None;
    }
    let mut section = ReportSection::new("Performance Analysis", "performance", 5);
    for report in &run.performance {
        section.lines.push(format!(
            "{}: score {}, {} loop(s), {} nested",
            report.identity, report.score, report.loop_count, report.nested_loops
        ));
        section.lines.extend(report.recommendations.iter().cloned());
    }
    section.data = json!(run.performance);
    Some(section)
}

fn security_section(run: &PipelineRun) -> Option<ReportSection> {
    let security = run.security.as_ref()?;
    let mut section = ReportSection::new("Security Analysis", "security", 6);
    section.lines.push(format!(
        "Security score {} / 100, risk level {}",
        security.security_score, security.risk_level
    ));
    for vulnerability in &security.vulnerabilities {
        section.lines.push(format!(
            "{}: [{}] {}",
            vulnerability.identity, vulnerability.finding.severity, vulnerability.finding.message
        ));
    }
    for check in &security.compliance {
        section.lines.push(format!(
            "{}: {} ({} violation(s))",
            check.standard,
            check.status,
            check.violations.len()
        ));
    }
    section.data = json!(security);
    Some(section)
}

fn metadata(run: &PipelineRun) -> ReportMetadata {
    let mut languages: Vec<String> = run
        .canonical
        .iter()
        .filter_map(|record| record.representative.language.clone())
        .collect();
    languages.sort();
    languages.dedup();

    let mut frameworks: Vec<String> = run
        .canonical
        .iter()
        .filter_map(|record| record.representative.ui_framework.clone())
        .collect();
    frameworks.sort();
    frameworks.dedup();

    ReportMetadata {
        run_id: run.run_id.to_string(),
        version: crate::VERSION.to_string(),
        status: run.status.to_string(),
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_ms: run.duration_ms(),
        input_sources: run.inputs.clone(),
        languages_detected: languages,
        frameworks_detected: frameworks,
        analysis_confidence: run.confidence,
        enhancement_confidence: mean_confidence(run.enhancements.iter().map(|e| e.confidence)),
        processing_pipeline: run.stages.iter().map(|stage| stage.stage_name.clone()).collect(),
    }
}
