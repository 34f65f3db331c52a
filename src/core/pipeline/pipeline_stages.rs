//! Per-record analysis and enhancement stages plus the run-level
//! aggregation steps (security summary, validation).

use std::future::Future;
use std::time::Duration;

use futures::future;
use tracing::{debug, warn};

use crate::core::config::DuckyConfig;
use crate::core::errors::{DuckyError, Result};
use crate::core::record::{
    mean_confidence, CanonicalRecord, ContentCategory, ContentRecord, Finding, Severity,
};
use crate::detectors::enhance::{apply_enhancements, filter_enhancements};
use crate::detectors::rules::security::ComplianceChecker;
use crate::detectors::rules::{security_score, sort_by_line, ComplexityMetrics, RuleRegistry};
use crate::ingest::IngestFailure;

use super::pipeline_results::{
    RecordAnalysis, RecordEnhancement, SecuritySummary, ValidationReport, Vulnerability,
};

/// Runs the registry's evaluators over canonical records with per-record
/// failure isolation.
pub struct PipelineStages {
    registry: RuleRegistry,
    evaluator_timeout: Option<Duration>,
    confidence_threshold: f64,
    apply_enhancements: bool,
}

impl PipelineStages {
    /// Stages over `registry`, with budgets and thresholds from `config`.
    pub fn new(registry: RuleRegistry, config: &DuckyConfig) -> Self {
        Self {
            registry,
            evaluator_timeout: config.pipeline.evaluator_timeout_ms.map(Duration::from_millis),
            confidence_threshold: config.enhancement.confidence_threshold,
            apply_enhancements: config.enhancement.apply_enhancements,
        }
    }

    /// The evaluators in use.
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Analyze every record concurrently. Output order matches `records`.
    pub async fn analyze(&self, records: &[CanonicalRecord]) -> Vec<RecordAnalysis> {
        let tasks = records
            .iter()
            .map(|canonical| self.analyze_record(&canonical.representative));
        future::join_all(tasks).await
    }

    async fn analyze_record(&self, record: &ContentRecord) -> RecordAnalysis {
        let mut findings = Vec::new();
        let mut errors = Vec::new();

        for analyzer in self.registry.analyzers() {
            let outcome = bounded(
                self.evaluator_timeout,
                analyzer.name(),
                &record.identity,
                analyzer.evaluate(record),
            )
            .await;

            match outcome {
                Ok(found) => findings.extend(found),
                Err(e) => {
                    warn!("Analyzer '{}' failed on {}: {}", analyzer.name(), record.identity, e);
                    errors.push(e.to_string());
                }
            }
        }

        sort_by_line(&mut findings);
        let metrics = (record.category == ContentCategory::Code)
            .then(|| ComplexityMetrics::measure(&record.text));
        // Zero findings is zero confidence, not "all clear".
        let confidence = if errors.is_empty() {
            mean_confidence(findings.iter().map(|finding| finding.confidence))
        } else {
            0.0
        };

        debug!(
            "Analyzed {}: {} findings, confidence {:.2}",
            record.identity,
            findings.len(),
            confidence
        );

        RecordAnalysis {
            identity: record.identity.clone(),
            language: record.language.clone(),
            findings,
            metrics,
            confidence,
            errors,
        }
    }

    /// Propose, filter and optionally apply enhancements for every record.
    /// `analyses` must be index-aligned with `records`.
    pub async fn enhance(
        &self,
        records: &[CanonicalRecord],
        analyses: &[RecordAnalysis],
    ) -> Vec<RecordEnhancement> {
        let tasks = records.iter().enumerate().map(|(index, canonical)| {
            let findings = analyses
                .get(index)
                .map(|analysis| analysis.findings.as_slice())
                .unwrap_or(&[]);
            self.enhance_record(&canonical.representative, findings)
        });
        future::join_all(tasks).await
    }

    async fn enhance_record(&self, record: &ContentRecord, findings: &[Finding]) -> RecordEnhancement {
        let mut proposed = Vec::new();
        let mut errors = Vec::new();

        for enhancer in self.registry.enhancers() {
            let outcome = bounded(
                self.evaluator_timeout,
                enhancer.name(),
                &record.identity,
                enhancer.propose(record, findings),
            )
            .await;

            match outcome {
                Ok(found) => proposed.extend(found),
                Err(e) => {
                    warn!("Enhancer '{}' failed on {}: {}", enhancer.name(), record.identity, e);
                    errors.push(e.to_string());
                }
            }
        }

        let confidence = if errors.is_empty() {
            mean_confidence(proposed.iter().map(|enhancement| enhancement.confidence))
        } else {
            0.0
        };

        let enhancements = filter_enhancements(proposed, self.confidence_threshold);
        let (enhanced_text, applied) = if self.apply_enhancements && !enhancements.is_empty() {
            let result = apply_enhancements(&record.text, &enhancements);
            (Some(result.text), result.applied)
        } else {
            (None, 0)
        };

        RecordEnhancement {
            identity: record.identity.clone(),
            enhancements,
            enhanced_text,
            applied,
            confidence,
            errors,
        }
    }
}

/// Await `call`, turning a missed budget or a foreign error into an
/// evaluator error for `record`.
async fn bounded<T, F>(
    budget: Option<Duration>,
    evaluator: &str,
    record: &str,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let outcome = match budget {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return Err(DuckyError::evaluator(
                    evaluator,
                    record,
                    format!("timed out after {}ms", limit.as_millis()),
                ))
            }
        },
        None => call.await,
    };

    outcome.map_err(|e| match e {
        DuckyError::Evaluator { .. } => e,
        other => DuckyError::evaluator(evaluator, record, other.to_string()),
    })
}

/// Aggregate the security findings of every record and check compliance.
pub fn summarize_security(
    canonical: &[CanonicalRecord],
    analyses: &[RecordAnalysis],
    standards: &[String],
    checker: &ComplianceChecker,
) -> SecuritySummary {
    let vulnerabilities: Vec<Vulnerability> = analyses
        .iter()
        .flat_map(|analysis| {
            analysis
                .findings
                .iter()
                .filter(|finding| finding.kind == "security")
                .map(|finding| Vulnerability {
                    identity: analysis.identity.clone(),
                    finding: finding.clone(),
                })
        })
        .collect();

    let findings: Vec<Finding> = vulnerabilities
        .iter()
        .map(|vulnerability| vulnerability.finding.clone())
        .collect();
    let worst = findings
        .iter()
        .map(|finding| finding.severity)
        .max()
        .unwrap_or(Severity::Low);

    let compliance = checker.check(
        standards,
        canonical
            .iter()
            .map(|record| (record.identity(), record.representative.text.as_str())),
    );

    SecuritySummary {
        security_score: security_score(&findings),
        risk_level: worst.as_str().to_string(),
        vulnerabilities,
        compliance,
    }
}

/// Record completeness and quality issues. Never fails.
pub fn validate_run(
    failures: &[IngestFailure],
    canonical: &[CanonicalRecord],
    analyses: &[RecordAnalysis],
    enhancements: &[RecordEnhancement],
    confidence_threshold: f64,
) -> ValidationReport {
    let mut issues = Vec::new();

    for failure in failures {
        issues.push(format!("Data processing error for {}", failure.input));
    }

    for (index, record) in canonical.iter().enumerate() {
        let complete = analyses
            .get(index)
            .filter(|analysis| analysis.identity == record.identity())
            .is_some_and(RecordAnalysis::is_complete);
        if !complete {
            issues.push(format!("Analysis incomplete for {}", record.identity()));
        }
    }

    // An empty proposal list scores 0 but accepts nothing.
    for entry in enhancements {
        let accepted_low = !entry.enhancements.is_empty() && entry.confidence < confidence_threshold;
        if !entry.errors.is_empty() || accepted_low {
            issues.push(format!("Enhancement quality low for {}", entry.identity));
        }
    }

    ValidationReport { issues }
}

#[cfg(test)]
#[path = "pipeline_stages_tests.rs"]
mod tests;
