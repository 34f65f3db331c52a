//! SARIF 2.1.0 log built from the run's findings.

use indexmap::IndexMap;
use serde::Serialize;

use crate::core::pipeline::PipelineRun;
use crate::core::record::{Finding, Severity};

pub const SARIF_VERSION: &str = "2.1.0";
pub const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

#[derive(Debug, Serialize)]
pub struct SarifLog {
    pub version: &'static str,
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize)]
pub struct SarifDriver {
    pub name: &'static str,
    pub version: &'static str,
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    pub short_description: SarifMessage,
}

#[derive(Debug, Serialize)]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: &'static str,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: PhysicalLocation,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    pub artifact_location: ArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactLocation {
    pub uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub start_line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
}

/// SARIF result level for a severity.
pub fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low => "note",
    }
}

fn result_for(identity: &str, finding: &Finding) -> SarifResult {
    let mut message = finding.message.clone();
    if let Some(suggestion) = &finding.suggestion {
        message.push_str(". ");
        message.push_str(suggestion);
    }

    SarifResult {
        rule_id: finding.rule_id.clone(),
        level: sarif_level(finding.severity),
        message: SarifMessage { text: message },
        locations: vec![SarifLocation {
            physical_location: PhysicalLocation {
                artifact_location: ArtifactLocation {
                    uri: identity.to_string(),
                },
                region: finding.location.as_ref().map(|location| Region {
                    start_line: location.line,
                    start_column: location.column,
                }),
            },
        }],
    }
}

/// One SARIF run holding every finding; rules are listed once each in
/// first-seen order.
pub fn build_sarif(run: &PipelineRun) -> SarifLog {
    let mut rules: IndexMap<String, String> = IndexMap::new();
    let mut results = Vec::new();
    for (identity, finding) in run.findings() {
        rules
            .entry(finding.rule_id.clone())
            .or_insert_with(|| format!("{} check", finding.kind));
        results.push(result_for(identity, finding));
    }

    SarifLog {
        version: SARIF_VERSION,
        schema: SARIF_SCHEMA,
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "DuckyCoder",
                    version: crate::VERSION,
                    rules: rules
                        .into_iter()
                        .map(|(id, text)| SarifRule {
                            id,
                            short_description: SarifMessage { text },
                        })
                        .collect(),
                },
            },
            results,
        }],
    }
}
