//! Records, findings and enhancements that flow between pipeline stages.
//!
//! Every value here is created once by the stage that owns it and only read
//! afterwards. Later stages derive new values instead of mutating earlier
//! ones.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::errors::{DuckyError, Result};

/// Identity used for raw-content inputs.
pub const STRING_IDENTITY: &str = "<string>";

/// Broad content class a record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    /// Source code
    Code,
    /// Markup and stylesheets
    Markup,
    /// Structured or tabular data
    Data,
    /// Prose documents
    Document,
}

impl ContentCategory {
    /// Lower-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Markup => "markup",
            Self::Data => "data",
            Self::Document => "document",
        }
    }

    /// Source code or markup, i.e. something loops and calls can live in.
    pub fn is_code(self) -> bool {
        matches!(self, Self::Code | Self::Markup)
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingested unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentRecord {
    /// Source path, or [`STRING_IDENTITY`] for raw content
    pub identity: String,
    /// Content class
    pub category: ContentCategory,
    /// Detected language, if any
    pub language: Option<String>,
    /// Decoded text
    pub text: String,
    /// Parsed form for JSON, YAML and XML inputs
    pub structured: Option<serde_json::Value>,
    /// Imported modules and packages
    pub dependencies: BTreeSet<String>,
    /// SHA-256 of the text bytes, lower-case hex
    pub fingerprint: String,
    /// Size of the decoded text in bytes
    pub size_bytes: usize,
    /// Detected UI framework, if any
    pub ui_framework: Option<String>,
}

impl ContentRecord {
    /// Create a record; the fingerprint is derived from `text`.
    pub fn new(
        identity: impl Into<String>,
        category: ContentCategory,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        Self {
            identity: identity.into(),
            category,
            language: None,
            fingerprint: fingerprint(&text),
            size_bytes: text.len(),
            text,
            structured: None,
            dependencies: BTreeSet::new(),
            ui_framework: None,
        }
    }

    /// Set the detected language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attach a parsed form.
    pub fn with_structured(mut self, structured: serde_json::Value) -> Self {
        self.structured = Some(structured);
        self
    }

    /// Attach extracted dependencies.
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set the detected UI framework.
    pub fn with_ui_framework(mut self, framework: impl Into<String>) -> Self {
        self.ui_framework = Some(framework.into());
        self
    }

    /// Language label, `"unknown"` when undetected.
    pub fn language_or_unknown(&self) -> &str {
        self.language.as_deref().unwrap_or("unknown")
    }

    /// Number of lines in the text.
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Deterministic content hash: SHA-256 hex over the UTF-8 bytes.
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// A deduplicated representative plus the identities merged into it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalRecord {
    /// The chosen representative
    pub representative: ContentRecord,
    /// Identities of every member, in input order; never empty
    pub provenance: Vec<String>,
}

impl CanonicalRecord {
    /// Wrap a single record.
    pub fn passthrough(record: ContentRecord) -> Self {
        Self {
            provenance: vec![record.identity.clone()],
            representative: record,
        }
    }

    /// Identity of the representative.
    pub fn identity(&self) -> &str {
        &self.representative.identity
    }

    /// Whether more than one input collapsed into this record.
    pub fn is_merged(&self) -> bool {
        self.provenance.len() > 1
    }
}

/// Ordered severity of a finding.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic
    #[default]
    Low,
    /// Worth fixing
    Medium,
    /// Likely bug or exposure
    High,
    /// Exploitable or breaking
    Critical,
}

impl Severity {
    /// Every severity, lowest first.
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Lower-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a finding in the record text (1-based).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    /// Line number
    pub line: usize,
    /// Column number
    pub column: Option<usize>,
}

/// An issue or observation produced by a rule evaluator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Evaluator family, e.g. `syntax`, `logic`, `security`
    pub kind: String,
    /// Stable rule identifier
    pub rule_id: String,
    /// Severity
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Where the finding applies
    pub location: Option<Location>,
    /// Evaluator confidence in [0, 1]
    pub confidence: f64,
    /// Suggested remedy
    pub suggestion: Option<String>,
    /// CWE identifier for security findings
    pub cwe: Option<String>,
}

impl Finding {
    /// Create a finding; confidence is clamped into [0, 1].
    pub fn new(
        kind: impl Into<String>,
        rule_id: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            kind: kind.into(),
            rule_id: rule_id.into(),
            severity,
            message: message.into(),
            location: None,
            confidence: clamp_unit(confidence),
            suggestion: None,
            cwe: None,
        }
    }

    /// Attach a line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.location = Some(Location { line, column: None });
        self
    }

    /// Attach a line and column.
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(Location {
            line,
            column: Some(column),
        });
        self
    }

    /// Attach a remedy.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach a CWE identifier.
    pub fn with_cwe(mut self, cwe: impl Into<String>) -> Self {
        self.cwe = Some(cwe.into());
        self
    }

    /// Line number, if located.
    pub fn line(&self) -> Option<usize> {
        self.location.map(|location| location.line)
    }
}

/// Kind of transformation an enhancement proposes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementKind {
    /// Corrects a defect
    Fix,
    /// Improves performance
    Optimization,
    /// Restructures without changing behavior
    Refactor,
}

impl EnhancementKind {
    /// Lower-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fix => "fix",
            Self::Optimization => "optimization",
            Self::Refactor => "refactor",
        }
    }
}

/// Three-step impact and risk scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Low
    Low,
    /// Medium
    Medium,
    /// High
    High,
}

impl Level {
    /// Lower-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A proposed or applied transformation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enhancement {
    /// Transformation kind
    pub kind: EnhancementKind,
    /// Topic, e.g. `security`, `style`, `performance`
    pub category: String,
    /// What the change does
    pub description: String,
    /// Enhancer confidence in [0, 1]
    pub confidence: f64,
    /// Expected benefit
    pub impact_level: Level,
    /// Chance of changing behavior
    pub risk_level: Level,
    /// Original text, required for high-risk fixes
    pub before_text: Option<String>,
    /// Replacement text
    pub after_text: String,
    /// Line the change applies to
    pub line: Option<usize>,
}

impl Enhancement {
    /// Create a low-risk, medium-impact enhancement.
    pub fn new(
        kind: EnhancementKind,
        category: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
        after_text: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            category: category.into(),
            description: description.into(),
            confidence: clamp_unit(confidence),
            impact_level: Level::Medium,
            risk_level: Level::Low,
            before_text: None,
            after_text: after_text.into(),
            line: None,
        }
    }

    /// Set impact and risk.
    pub fn with_levels(mut self, impact: Level, risk: Level) -> Self {
        self.impact_level = impact;
        self.risk_level = risk;
        self
    }

    /// Record the original text.
    pub fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before_text = Some(before.into());
        self
    }

    /// Attach a line number.
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Check the audit invariant: a high-risk fix must carry its original text.
    pub fn validate(&self) -> Result<()> {
        let has_before = self
            .before_text
            .as_deref()
            .is_some_and(|before| !before.is_empty());
        if self.kind == EnhancementKind::Fix && self.risk_level == Level::High && !has_before {
            return Err(DuckyError::validation_field(
                format!("high-risk fix '{}' has no recorded original", self.description),
                "before_text",
                "non-empty original text",
                "none",
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DuckyError::validation(format!(
                "enhancement confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Clamp a score into [0, 1]; NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Arithmetic mean of confidences, 0.0 for an empty list.
pub fn mean_confidence<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        0.0
    } else {
        clamp_unit(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = ContentRecord::new("a.py", ContentCategory::Code, "print('hi')");
        let b = ContentRecord::new("b.py", ContentCategory::Code, "print('hi')");
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.fingerprint, fingerprint("print('hi')"));
        assert_eq!(a.fingerprint.len(), 64);
        assert_ne!(a.fingerprint, fingerprint("print('bye')"));
    }

    #[test]
    fn fingerprint_matches_known_digest() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn severity_is_ordered() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn finding_confidence_is_clamped() {
        let finding = Finding::new("style", "X", Severity::Low, "msg", 1.7);
        assert_eq!(finding.confidence, 1.0);
        let finding = Finding::new("style", "X", Severity::Low, "msg", f64::NAN);
        assert_eq!(finding.confidence, 0.0);
    }

    #[test]
    fn high_risk_fix_requires_original() {
        let bare = Enhancement::new(EnhancementKind::Fix, "security", "drop eval", 0.9, "")
            .with_levels(Level::High, Level::High);
        assert!(bare.validate().is_err());

        let recorded = bare.clone().with_before("eval(x)");
        assert!(recorded.validate().is_ok());

        let refactor = Enhancement::new(EnhancementKind::Refactor, "style", "rename", 0.9, "y")
            .with_levels(Level::Low, Level::High);
        assert!(refactor.validate().is_ok());
    }

    #[test]
    fn mean_confidence_of_empty_is_zero() {
        assert_eq!(mean_confidence(Vec::<f64>::new()), 0.0);
        assert!((mean_confidence(vec![0.5, 1.0]) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn passthrough_keeps_identity() {
        let record = ContentRecord::new("a.py", ContentCategory::Code, "x = 1");
        let canonical = CanonicalRecord::passthrough(record.clone());
        assert_eq!(canonical.provenance, vec!["a.py".to_string()]);
        assert_eq!(canonical.representative, record);
        assert!(!canonical.is_merged());
    }
}
