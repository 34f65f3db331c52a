//! Line-level syntax and formatting checks.

use async_trait::async_trait;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::{char_column, is_comment_or_blank, sort_by_line, RuleEvaluator, JS_FAMILY, PYTHON};
use crate::core::errors::Result;
use crate::core::record::{ContentCategory, ContentRecord, Finding, Severity};

/// Longest line accepted before `LINE_TOO_LONG` fires.
pub const MAX_LINE_LENGTH: usize = 120;

const KIND: &str = "syntax";

/// Formatting and statement-termination checks.
#[derive(Debug, Clone)]
pub struct SyntaxAnalyzer {
    js_statement: Regex,
}

impl SyntaxAnalyzer {
    /// Compile the analyzer patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            js_statement: Regex::new(
                r"^(?:(?:let|const|var)\s+\w+|return\b|throw\b|[\w$.]+\s*(?:[+\-*/]?=)[^=>]|[\w$.]+\(.*\)$)",
            )?,
        })
    }

    fn check_lines(&self, record: &ContentRecord, findings: &mut Vec<Finding>) {
        let language = record.language.as_deref().unwrap_or_default();
        let is_js = JS_FAMILY.contains(&language);
        let is_python = PYTHON.contains(&language);

        for (index, line) in record.text.lines().enumerate() {
            let number = index + 1;
            let width = line.graphemes(true).count();

            if width > MAX_LINE_LENGTH {
                findings.push(
                    Finding::new(
                        KIND,
                        "LINE_TOO_LONG",
                        Severity::Low,
                        format!("Line is {width} characters long (limit {MAX_LINE_LENGTH})"),
                        0.95,
                    )
                    .at(number, MAX_LINE_LENGTH + 1)
                    .with_suggestion("Break the line into shorter statements"),
                );
            }

            if line.ends_with(' ') || line.ends_with('\t') {
                findings.push(
                    Finding::new(
                        KIND,
                        "TRAILING_WHITESPACE",
                        Severity::Low,
                        "Trailing whitespace",
                        0.9,
                    )
                    .at(number, char_column(line, line.trim_end().len()))
                    .with_suggestion("Remove trailing whitespace"),
                );
            }

            if record.category != ContentCategory::Code || is_comment_or_blank(line) {
                continue;
            }

            let trimmed = line.trim();
            if is_js {
                if trimmed.ends_with(";;") {
                    findings.push(
                        Finding::new(KIND, "EXTRA_SEMICOLON", Severity::Low, "Duplicate semicolon", 0.85)
                            .at_line(number)
                            .with_suggestion("Remove the extra semicolon"),
                    );
                } else if self.js_statement.is_match(trimmed) && !ends_statement(trimmed) {
                    findings.push(
                        Finding::new(
                            KIND,
                            "MISSING_SEMICOLON",
                            Severity::Low,
                            "Statement is not terminated with a semicolon",
                            0.6,
                        )
                        .at_line(number)
                        .with_suggestion("Terminate the statement with ';'"),
                    );
                }
            } else if is_python && trimmed.ends_with(';') {
                findings.push(
                    Finding::new(
                        KIND,
                        "EXTRA_SEMICOLON",
                        Severity::Low,
                        "Python statements do not need a trailing semicolon",
                        0.8,
                    )
                    .at_line(number)
                    .with_suggestion("Remove the trailing semicolon"),
                );
            }
        }
    }

    fn check_indentation(&self, record: &ContentRecord, findings: &mut Vec<Finding>) {
        if record.language.as_deref() != Some("python") {
            return;
        }

        let mut seen_tabs = false;
        let mut seen_spaces = false;
        for (index, line) in record.text.lines().enumerate() {
            let indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            if indent.is_empty() || line.trim().is_empty() {
                continue;
            }
            seen_tabs |= indent.contains('\t');
            seen_spaces |= indent.contains(' ');
            if seen_tabs && seen_spaces {
                findings.push(
                    Finding::new(
                        KIND,
                        "MIXED_INDENTATION",
                        Severity::Medium,
                        "Tabs and spaces are mixed in indentation",
                        0.85,
                    )
                    .at_line(index + 1)
                    .with_suggestion("Indent consistently with four spaces"),
                );
                return;
            }
        }
    }
}

fn ends_statement(line: &str) -> bool {
    matches!(
        line.chars().last(),
        Some(';' | '{' | '}' | ',' | '(' | '[' | ':' | '>' | '&' | '|' | '+' | '.')
    )
}

#[async_trait]
impl RuleEvaluator for SyntaxAnalyzer {
    fn name(&self) -> &str {
        KIND
    }

    async fn evaluate(&self, record: &ContentRecord) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        self.check_lines(record, &mut findings);
        self.check_indentation(record, &mut findings);
        sort_by_line(&mut findings);
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(language: &str, text: &str) -> ContentRecord {
        ContentRecord::new("sample", ContentCategory::Code, text).with_language(language)
    }

    fn rule_ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.rule_id.as_str()).collect()
    }

    #[tokio::test]
    async fn flags_long_lines_and_trailing_whitespace() {
        let analyzer = SyntaxAnalyzer::new().unwrap();
        let long = format!("x = '{}'", "a".repeat(130));
        let text = format!("{long}\ny = 2   \n");
        let findings = analyzer.evaluate(&record("python", &text)).await.unwrap();

        assert_eq!(rule_ids(&findings), vec!["LINE_TOO_LONG", "TRAILING_WHITESPACE"]);
        assert_eq!(findings[1].line(), Some(2));
    }

    #[tokio::test]
    async fn trailing_whitespace_column_counts_characters() {
        let analyzer = SyntaxAnalyzer::new().unwrap();
        let findings = analyzer
            .evaluate(&record("python", "name = \"Zoë\"  \n"))
            .await
            .unwrap();

        let trailing = findings
            .iter()
            .find(|f| f.rule_id == "TRAILING_WHITESPACE")
            .unwrap();
        assert_eq!(trailing.location.unwrap().column, Some(13));
    }

    #[tokio::test]
    async fn javascript_semicolons() {
        let analyzer = SyntaxAnalyzer::new().unwrap();
        let text = "const a = 1\nlet b = 2;;\nfunction f() {\n  return a;\n}\n";
        let findings = analyzer.evaluate(&record("javascript", text)).await.unwrap();

        assert_eq!(rule_ids(&findings), vec!["MISSING_SEMICOLON", "EXTRA_SEMICOLON"]);
        assert_eq!(findings[0].line(), Some(1));
        assert_eq!(findings[1].line(), Some(2));
    }

    #[tokio::test]
    async fn python_mixed_indentation_reported_once() {
        let analyzer = SyntaxAnalyzer::new().unwrap();
        let text = "def f():\n    a = 1\n\tb = 2\n\tc = 3\n";
        let findings = analyzer.evaluate(&record("python", text)).await.unwrap();

        assert_eq!(rule_ids(&findings), vec!["MIXED_INDENTATION"]);
        assert_eq!(findings[0].line(), Some(3));
    }

    #[tokio::test]
    async fn clean_python_has_no_findings() {
        let analyzer = SyntaxAnalyzer::new().unwrap();
        let text = "def add(a, b):\n    return a + b\n";
        let findings = analyzer.evaluate(&record("python", text)).await.unwrap();
        assert!(findings.is_empty());
    }
}
