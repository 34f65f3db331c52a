//! Project-context checks: dependencies, imports, naming and documentation.

use async_trait::async_trait;
use regex::Regex;

use super::{is_comment_or_blank, scan_lines, sort_by_line, PatternRule, RuleEvaluator, PYTHON};
use crate::core::errors::Result;
use crate::core::record::{ContentRecord, Finding, Severity};

const KIND: &str = "context";

/// Dependency, import, naming and docstring checks.
#[derive(Debug, Clone)]
pub struct ContextAnalyzer {
    rules: Vec<PatternRule>,
    python_def: Regex,
}

impl ContextAnalyzer {
    /// Compile the rule table.
    pub fn new() -> Result<Self> {
        let rules = vec![
            PatternRule::new(
                "DEPRECATED_DEPENDENCY",
                r"^\s*(?:import|from)\s+(?:md5|sha|urllib2)\b",
                Severity::Medium,
                "Module is deprecated and removed from modern Python",
                0.85,
            )?
            .suggest("Use hashlib or urllib.request instead")
            .only(PYTHON),
            PatternRule::new(
                "DEPRECATED_DEPENDENCY",
                r"\bhashlib\.(?:md5|sha1)\s*\(",
                Severity::Medium,
                "MD5 and SHA-1 are deprecated for security-sensitive hashing",
                0.8,
            )?
            .suggest("Use hashlib.sha256 or stronger"),
            PatternRule::new(
                "WILDCARD_IMPORT",
                r"^\s*from\s+[\w.]+\s+import\s+\*",
                Severity::Low,
                "Wildcard import hides where names come from",
                0.9,
            )?
            .suggest("Import the names you use explicitly")
            .only(PYTHON),
            PatternRule::new(
                "WILDCARD_IMPORT",
                r"^\s*import\s+[\w.]+\.\*\s*;",
                Severity::Low,
                "Wildcard import hides where names come from",
                0.85,
            )?
            .suggest("Import the classes you use explicitly")
            .only(&["java"]),
            PatternRule::new(
                "WILDCARD_IMPORT",
                r"^\s*use\s+[\w:]+::\*\s*;",
                Severity::Low,
                "Glob import hides where names come from",
                0.6,
            )?
            .suggest("Import the items you use explicitly")
            .only(&["rust"]),
        ];

        Ok(Self {
            rules,
            python_def: Regex::new(r"^(\s*)def\s+([A-Za-z_]\w*)\s*\(")?,
        })
    }

    fn python_definitions(&self, lines: &[&str], findings: &mut Vec<Finding>) {
        for (index, line) in lines.iter().enumerate() {
            let Some(caps) = self.python_def.captures(line) else {
                continue;
            };
            let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

            if !name.starts_with("__") && name.chars().any(char::is_uppercase) {
                findings.push(
                    Finding::new(
                        KIND,
                        "FUNCTION_NAMING",
                        Severity::Low,
                        format!("Function '{name}' is not snake_case"),
                        0.85,
                    )
                    .at_line(index + 1)
                    .with_suggestion(format!("Rename to '{}'", to_snake_case(name))),
                );
            }

            if name.starts_with('_') || !line.trim_end().ends_with(':') {
                continue;
            }
            let documented = lines
                .iter()
                .skip(index + 1)
                .find(|candidate| !is_comment_or_blank(candidate))
                .is_some_and(|body| {
                    let body = body.trim_start();
                    ["\"\"\"", "'''", "r\"\"\"", "r'''"]
                        .iter()
                        .any(|quote| body.starts_with(quote))
                });
            if !documented {
                findings.push(
                    Finding::new(
                        KIND,
                        "MISSING_DOCSTRING",
                        Severity::Low,
                        format!("Public function '{name}' has no docstring"),
                        0.7,
                    )
                    .at_line(index + 1)
                    .with_suggestion("Describe the function in a docstring"),
                );
            }
        }
    }
}

/// Convert `camelCase` or `PascalCase` to `snake_case`.
pub fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for c in name.chars() {
        if c.is_uppercase() {
            if previous_lower {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
            previous_lower = false;
        } else {
            previous_lower = c.is_lowercase() || c.is_ascii_digit();
            snake.push(c);
        }
    }
    snake
}

#[async_trait]
impl RuleEvaluator for ContextAnalyzer {
    fn name(&self) -> &str {
        KIND
    }

    async fn evaluate(&self, record: &ContentRecord) -> Result<Vec<Finding>> {
        let mut findings = scan_lines(KIND, &self.rules, record, true);
        if record.language.as_deref() == Some("python") {
            let lines: Vec<&str> = record.text.lines().collect();
            self.python_definitions(&lines, &mut findings);
        }
        sort_by_line(&mut findings);
        Ok(findings)
    }
}
