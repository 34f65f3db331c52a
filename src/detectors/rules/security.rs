//! Security pattern scanning and compliance checks.
//!
//! Lines are prefiltered with an Aho-Corasick automaton over the trigger
//! keywords of every rule, so the regex table only runs on candidate lines.

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{char_column, sort_by_line, PatternRule, RuleEvaluator};
use crate::core::errors::{DuckyError, Result};
use crate::core::record::{ContentRecord, Finding, Severity};

const KIND: &str = "security";

const TRIGGERS: &[&str] = &[
    "eval", "exec", "system", "shell", "child_process", "password", "passwd", "pwd", "secret",
    "key", "token", "pickle", "marshal", "random", "execute", "query", "raw",
];

/// Pattern-based vulnerability scanner.
#[derive(Debug, Clone)]
pub struct SecurityAnalyzer {
    rules: Vec<PatternRule>,
    prefilter: AhoCorasick,
    remediation: bool,
}

impl SecurityAnalyzer {
    /// Compile the rule table; `remediation` attaches fix suggestions.
    pub fn new(remediation: bool) -> Result<Self> {
        let rules = vec![
            PatternRule::new(
                "CWE-94",
                r"(?:^|[^.\w])(?:eval|exec)\s*\(",
                Severity::Critical,
                "Dynamic code execution with eval/exec",
                0.9,
            )?
            .cwe("CWE-94")
            .suggest("Parse data with ast.literal_eval or a JSON parser instead"),
            PatternRule::new(
                "CWE-78",
                r"\bos\.system\s*\(|\bsubprocess\.\w+\(.*shell\s*=\s*True|\bchild_process\.exec\s*\(",
                Severity::High,
                "Shell command built from program data",
                0.85,
            )?
            .cwe("CWE-78")
            .suggest("Pass an argument list to subprocess without shell=True"),
            PatternRule::new(
                "CWE-798",
                r#"(?i)\b(?:password|passwd|pwd|secret|api_?key|access_?key|auth_?token|token)\b\s*[:=]\s*["'][^"']{4,}["']"#,
                Severity::High,
                "Hardcoded credential",
                0.8,
            )?
            .cwe("CWE-798")
            .suggest("Load credentials from the environment or a secret store"),
            PatternRule::new(
                "CWE-502",
                r"\b(?:pickle|cPickle|marshal)\.loads?\s*\(",
                Severity::Medium,
                "Deserialization of untrusted data",
                0.75,
            )?
            .cwe("CWE-502")
            .suggest("Use a data-only format such as JSON"),
            PatternRule::new(
                "CWE-330",
                r"\brandom\.(?:random|randint|choice|randrange)\s*\(|\bMath\.random\s*\(",
                Severity::Low,
                "Non-cryptographic random number generator",
                0.6,
            )?
            .cwe("CWE-330")
            .suggest("Use the secrets module or crypto.getRandomValues for security values"),
            PatternRule::new(
                "CWE-89",
                r#"(?i)\b(?:execute|query|raw)\s*\(\s*(?:f["']|["'][^"']*\b(?:select|insert|update|delete)\b[^"']*["']\s*(?:%|\+|\.format))"#,
                Severity::High,
                "SQL statement built with string formatting",
                0.7,
            )?
            .cwe("CWE-89")
            .suggest("Use parameterized queries"),
        ];

        let prefilter = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(TRIGGERS)
            .map_err(|e| DuckyError::internal(format!("Failed to build security prefilter: {e}")))?;

        Ok(Self {
            rules,
            prefilter,
            remediation,
        })
    }
}

#[async_trait]
impl RuleEvaluator for SecurityAnalyzer {
    fn name(&self) -> &str {
        KIND
    }

    async fn evaluate(&self, record: &ContentRecord) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        for (index, line) in record.text.lines().enumerate() {
            if !self.prefilter.is_match(line) {
                continue;
            }
            for rule in self.rules.iter().filter(|rule| rule.applies_to(record)) {
                if let Some(found) = rule.pattern.find(line) {
                    let column = char_column(line, found.start());
                    findings.push(rule.finding(KIND, index + 1, column, self.remediation));
                }
            }
        }
        sort_by_line(&mut findings);
        Ok(findings)
    }
}

/// Score out of 100 over the `security` findings: critical −25, high −15,
/// medium −10, low −5, floored at 0.
pub fn security_score(findings: &[Finding]) -> u32 {
    let penalty: u32 = findings
        .iter()
        .filter(|finding| finding.kind == KIND)
        .map(|finding| match finding.severity {
            Severity::Critical => 25,
            Severity::High => 15,
            Severity::Medium => 10,
            Severity::Low => 5,
        })
        .sum();
    100u32.saturating_sub(penalty)
}

/// Outcome of checking one compliance standard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceCheck {
    /// Standard name as configured
    pub standard: String,
    /// `compliant`, `non_compliant` or `not_assessed`
    pub status: String,
    /// Identities and reasons for each violation
    pub violations: Vec<String>,
}

/// Data-handling checks for the standards that have text heuristics.
#[derive(Debug, Clone)]
pub struct ComplianceChecker {
    personal_data: Regex,
    health_data: Regex,
    card_data: Regex,
}

impl ComplianceChecker {
    /// Compile the compliance patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            personal_data: Regex::new(
                r"(?i)[\w.+-]+@[\w-]+\.[\w.]+|\b(?:ssn|social_security|date_of_birth|personal_data)\b",
            )?,
            health_data: Regex::new(r"(?i)\b(?:patient|diagnosis|medical_record|phi|prescription)\b")?,
            card_data: Regex::new(r"(?i)\b(?:card_number|credit_card|cvv)\b|\b(?:\d{4}[ -]?){3}\d{4}\b")?,
        })
    }

    /// Check every standard against the given `(identity, text)` pairs.
    pub fn check<'a, I>(&self, standards: &[String], records: I) -> Vec<ComplianceCheck>
    where
        I: IntoIterator<Item = (&'a str, &'a str)> + Clone,
    {
        standards
            .iter()
            .map(|standard| {
                let (pattern, reason) = match standard.to_ascii_uppercase().as_str() {
                    "GDPR" => (&self.personal_data, "personal data handled without safeguards"),
                    "HIPAA" => (&self.health_data, "health information present"),
                    "PCI" | "PCI-DSS" => (&self.card_data, "payment card data present"),
                    _ => {
                        return ComplianceCheck {
                            standard: standard.clone(),
                            status: "not_assessed".to_string(),
                            violations: Vec::new(),
                        }
                    }
                };

                let violations: Vec<String> = records
                    .clone()
                    .into_iter()
                    .filter(|(_, text)| pattern.is_match(text))
                    .map(|(identity, _)| format!("{identity}: {reason}"))
                    .collect();

                ComplianceCheck {
                    standard: standard.clone(),
                    status: if violations.is_empty() {
                        "compliant".to_string()
                    } else {
                        "non_compliant".to_string()
                    },
                    violations,
                }
            })
            .collect()
    }
}
