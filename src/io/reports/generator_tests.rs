use super::*;
use crate::core::pipeline::{PipelineRun, RecordAnalysis, ValidationReport};
use crate::core::record::{CanonicalRecord, ContentCategory, ContentRecord, Finding, Severity};
use tempfile::tempdir;

fn sample_document() -> ReportDocument {
    let mut run = PipelineRun::start(&["app.py".to_string()]);
    let record = ContentRecord::new("app.py", ContentCategory::Code, "x = eval(y)\n")
        .with_language("python");
    run.records_ingested = 1;
    run.canonical = vec![CanonicalRecord::passthrough(record)];
    run.analyses = vec![RecordAnalysis {
        identity: "app.py".to_string(),
        language: Some("python".to_string()),
        findings: vec![Finding::new(
            "security",
            "SEC001",
            Severity::Critical,
            "Use of eval() <unsafe>",
            0.9,
        )
        .at_line(1)],
        metrics: None,
        confidence: 0.9,
        errors: Vec::new(),
    }];
    run.confidence = 0.9;
    run.validation = ValidationReport {
        issues: vec!["Enhancement quality low for app.py".to_string()],
    };
    ReportDocument::compose(&run)
}

#[test]
fn markdown_report_contains_summary_and_sections() {
    let generator = ReportGenerator::new();
    let markdown = generator.render_markdown(&sample_document()).unwrap();

    assert!(markdown.starts_with("# DuckyCoder v"));
    assert!(markdown.contains("## Executive Summary"));
    assert!(markdown.contains("**Overall Status:** Good"));
    assert!(markdown.contains("| Critical findings | 1 |"));
    assert!(markdown.contains("## Code Analysis Results"));
    assert!(markdown.contains("Use of eval() <unsafe>"));
    assert!(markdown.contains("## Validation"));
    assert!(markdown.contains("analysis confidence 90%"));
}

#[test]
fn html_report_escapes_finding_text() {
    let generator = ReportGenerator::new();
    let html = generator.render_html(&sample_document()).unwrap();

    assert!(html.contains("<!DOCTYPE html>"));
    assert!(html.contains("class=\"status-good\""));
    assert!(html.contains("Use of eval() &lt;unsafe&gt;"));
    assert!(html.contains("<section id=\"analysis\">"));
}

#[test]
fn html_report_appends_run_metadata() {
    let document = sample_document();
    let html = ReportGenerator::new().render_html(&document).unwrap();

    assert!(html.contains("<section id=\"run-metadata\">"));
    assert!(html.contains(&format!("&quot;run_id&quot;: &quot;{}&quot;", document.metadata.run_id)));
    assert!(html.contains("analysis confidence 90% (0.90)"));
    assert!(html.contains(&format!("status {}", document.metadata.status.to_uppercase())));
}

#[test]
fn structured_formats_round_trip_the_document() {
    let generator = ReportGenerator::new();
    let document = sample_document();

    let json: serde_json::Value =
        serde_json::from_str(&generator.render_json(&document).unwrap()).unwrap();
    assert_eq!(json["summary"]["total_findings"], 1);
    assert_eq!(json["summary"]["overall_status"], "good");

    let yaml = generator.render_yaml(&document).unwrap();
    assert!(yaml.contains("total_findings: 1"));
}

#[test]
fn custom_template_file_replaces_builtin() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("custom.hbs");
    std::fs::write(&path, "files={{summary.files_processed}}").unwrap();

    let generator = ReportGenerator::new()
        .with_template_file(MARKDOWN_TEMPLATE_NAME, &path)
        .unwrap();

    assert_eq!(generator.render_markdown(&sample_document()).unwrap(), "files=1");
}
