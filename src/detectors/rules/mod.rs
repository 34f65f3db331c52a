//! Rule evaluators: the boundary between the pipeline and its analyzers.
//!
//! The pipeline only sees [`RuleEvaluator`] and [`Enhancer`] trait objects
//! held in a [`RuleRegistry`]. The default rule sets live in the sibling
//! modules and are plain line-oriented pattern tables.

pub mod context;
pub mod logic;
pub mod security;
pub mod syntax;

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::core::config::DuckyConfig;
use crate::core::errors::Result;
use crate::core::record::{ContentRecord, Enhancement, Finding, Severity};
use crate::detectors::enhance;

pub use context::ContextAnalyzer;
pub use logic::{ComplexityMetrics, LogicAnalyzer};
pub use security::{security_score, SecurityAnalyzer};
pub use syntax::SyntaxAnalyzer;

/// Produces findings for one record.
#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    /// Stable evaluator name, used in error annotations.
    fn name(&self) -> &str;

    /// Evaluate a single record.
    async fn evaluate(&self, record: &ContentRecord) -> Result<Vec<Finding>>;
}

/// Proposes enhancements for one record given its findings.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Stable enhancer name, used in error annotations.
    fn name(&self) -> &str;

    /// Propose enhancements for a single record.
    async fn propose(
        &self,
        record: &ContentRecord,
        findings: &[Finding],
    ) -> Result<Vec<Enhancement>>;
}

/// Immutable set of analyzers and enhancers, built once per process.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    analyzers: Vec<Arc<dyn RuleEvaluator>>,
    enhancers: Vec<Arc<dyn Enhancer>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field(
                "analyzers",
                &self.analyzers.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field(
                "enhancers",
                &self.enhancers.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl RuleRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in analyzers and enhancers.
    pub fn with_defaults(config: &DuckyConfig) -> Result<Self> {
        let mut registry = Self::new()
            .with_analyzer(Arc::new(SyntaxAnalyzer::new()?))
            .with_analyzer(Arc::new(LogicAnalyzer::new()?))
            .with_analyzer(Arc::new(ContextAnalyzer::new()?));

        if config.security_config.enable_scanning {
            registry = registry.with_analyzer(Arc::new(SecurityAnalyzer::new(
                config.security_config.remediation_suggestions,
            )?));
        }

        for enhancer in enhance::default_enhancers()? {
            registry = registry.with_enhancer(enhancer);
        }

        Ok(registry)
    }

    /// Add an analyzer.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn RuleEvaluator>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    /// Add an enhancer.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancers.push(enhancer);
        self
    }

    /// Registered analyzers, in registration order.
    pub fn analyzers(&self) -> &[Arc<dyn RuleEvaluator>] {
        &self.analyzers
    }

    /// Registered enhancers, in registration order.
    pub fn enhancers(&self) -> &[Arc<dyn Enhancer>] {
        &self.enhancers
    }
}

/// One regex-driven rule applied line by line.
#[derive(Debug, Clone)]
pub struct PatternRule {
    /// Rule identifier reported on findings
    pub rule_id: &'static str,
    /// Line pattern
    pub pattern: Regex,
    /// Severity of a match
    pub severity: Severity,
    /// Finding message
    pub message: &'static str,
    /// Confidence of a match
    pub confidence: f64,
    /// Remedy text
    pub suggestion: Option<&'static str>,
    /// CWE identifier
    pub cwe: Option<&'static str>,
    /// Languages the rule applies to; every language when empty
    pub languages: &'static [&'static str],
}

impl PatternRule {
    /// Compile a rule.
    pub fn new(
        rule_id: &'static str,
        pattern: &str,
        severity: Severity,
        message: &'static str,
        confidence: f64,
    ) -> Result<Self> {
        Ok(Self {
            rule_id,
            pattern: Regex::new(pattern)?,
            severity,
            message,
            confidence,
            suggestion: None,
            cwe: None,
            languages: &[],
        })
    }

    /// Attach remedy text.
    pub fn suggest(mut self, suggestion: &'static str) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Attach a CWE identifier.
    pub fn cwe(mut self, cwe: &'static str) -> Self {
        self.cwe = Some(cwe);
        self
    }

    /// Restrict to the given languages.
    pub fn only(mut self, languages: &'static [&'static str]) -> Self {
        self.languages = languages;
        self
    }

    /// Whether the rule runs for `record`.
    pub fn applies_to(&self, record: &ContentRecord) -> bool {
        self.languages.is_empty()
            || record
                .language
                .as_deref()
                .is_some_and(|language| self.languages.contains(&language))
    }

    /// Finding for a match on `line` at character `column`, both 1-based.
    pub fn finding(&self, kind: &str, line: usize, column: usize, with_suggestion: bool) -> Finding {
        let mut finding = Finding::new(kind, self.rule_id, self.severity, self.message, self.confidence)
            .at(line, column);
        if with_suggestion {
            if let Some(suggestion) = self.suggestion {
                finding = finding.with_suggestion(suggestion);
            }
        }
        if let Some(cwe) = self.cwe {
            finding = finding.with_cwe(cwe);
        }
        finding
    }
}

/// Run a rule table over a record, one finding per matching line.
pub fn scan_lines(
    kind: &str,
    rules: &[PatternRule],
    record: &ContentRecord,
    with_suggestions: bool,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for rule in rules.iter().filter(|rule| rule.applies_to(record)) {
        for (index, line) in record.text.lines().enumerate() {
            if let Some(found) = rule.pattern.find(line) {
                let column = char_column(line, found.start());
                findings.push(rule.finding(kind, index + 1, column, with_suggestions));
            }
        }
    }
    sort_by_line(&mut findings);
    findings
}

/// 1-based character column of the byte offset `byte` within `line`.
pub fn char_column(line: &str, byte: usize) -> usize {
    line[..byte].chars().count() + 1
}

/// Order findings by line, keeping rule order within a line.
pub fn sort_by_line(findings: &mut [Finding]) {
    findings.sort_by_key(|finding| finding.line().unwrap_or(0));
}

/// Languages in the JavaScript family.
pub const JS_FAMILY: &[&str] = &["javascript", "typescript"];

/// Python only.
pub const PYTHON: &[&str] = &["python"];

/// Whether a line is blank or a comment in common syntaxes.
pub fn is_comment_or_blank(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
}

/// Leading whitespace width, tabs counted as four columns.
pub fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::ContentCategory;

    #[test]
    fn default_registry_contains_every_family() {
        let registry = RuleRegistry::with_defaults(&DuckyConfig::default()).unwrap();
        let names: Vec<&str> = registry.analyzers().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["syntax", "logic", "context", "security"]);
        assert!(!registry.enhancers().is_empty());
    }

    #[test]
    fn security_analyzer_follows_config() {
        let mut config = DuckyConfig::default();
        config.security_config.enable_scanning = false;
        let registry = RuleRegistry::with_defaults(&config).unwrap();
        assert!(registry.analyzers().iter().all(|a| a.name() != "security"));
    }

    #[test]
    fn pattern_rules_respect_language_filter() {
        let rule = PatternRule::new("X", r"print", Severity::Low, "print", 0.5)
            .unwrap()
            .only(PYTHON);
        let python = ContentRecord::new("a.py", ContentCategory::Code, "print 1").with_language("python");
        let js = ContentRecord::new("a.js", ContentCategory::Code, "print 1").with_language("javascript");
        assert!(rule.applies_to(&python));
        assert!(!rule.applies_to(&js));

        let findings = scan_lines("style", &[rule], &python, true);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.unwrap().column, Some(1));
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let rule = PatternRule::new("X", r"print", Severity::Low, "print", 0.5).unwrap();
        let record = ContentRecord::new("a.py", ContentCategory::Code, "s = \"héllo wörld\"; print(s)")
            .with_language("python");

        let findings = scan_lines("style", &[rule], &record, false);
        assert_eq!(findings[0].location.unwrap().column, Some(20));
        assert_eq!(char_column("ü = 1", "ü".len()), 2);
    }

    #[test]
    fn indentation_helpers() {
        assert_eq!(indent_width("\t  x"), 6);
        assert!(is_comment_or_blank("   # note"));
        assert!(!is_comment_or_blank("x = 1"));
    }
}
