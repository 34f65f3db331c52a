//! Control-flow heuristics and complexity metrics.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{indent_width, is_comment_or_blank, sort_by_line, RuleEvaluator};
use crate::core::errors::Result;
use crate::core::record::{ContentRecord, Finding, Severity};

/// Function definitions above which a unit is reported as a god class.
pub const GOD_CLASS_FUNCTIONS: usize = 20;

/// Cyclomatic complexity above which `HIGH_COMPLEXITY` fires.
pub const HIGH_COMPLEXITY: usize = 10;

const KIND: &str = "logic";

const TERMINATORS: &[&str] = &["return", "raise", "break", "continue", "throw"];
const BLOCK_CONTINUATIONS: &[&str] = &[
    "}", ")", "]", "else", "elif", "except", "finally", "case", "default", "catch",
];
const DECISION_WORDS: &[&str] = &[
    "if", "elif", "for", "while", "case", "catch", "except", "and", "or", "match",
];
const FUNCTION_WORDS: &[&str] = &["def", "function", "fn"];

/// Size and complexity measurements for one text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComplexityMetrics {
    /// Non-blank, non-comment lines
    pub lines_of_code: usize,
    /// One plus the number of decision points
    pub cyclomatic: usize,
    /// Function definitions
    pub function_count: usize,
    /// Deepest indentation level, four columns per level
    pub max_nesting: usize,
    /// Maintainability index in [0, 100]
    pub maintainability_index: f64,
}

impl ComplexityMetrics {
    /// Measure `text`.
    pub fn measure(text: &str) -> Self {
        let mut lines_of_code = 0;
        let mut decisions = 0;
        let mut function_count = 0;
        let mut max_nesting = 0;
        let mut total_words = 0usize;
        let mut vocabulary = ahash::AHashSet::new();

        for line in text.lines().filter(|line| !is_comment_or_blank(line)) {
            lines_of_code += 1;
            max_nesting = max_nesting.max(indent_width(line) / 4);
            decisions += line.matches("&&").count() + line.matches("||").count();

            for word in line
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|word| !word.is_empty())
            {
                total_words += 1;
                vocabulary.insert(word);
                if DECISION_WORDS.contains(&word) {
                    decisions += 1;
                }
                if FUNCTION_WORDS.contains(&word) {
                    function_count += 1;
                }
            }
        }

        let cyclomatic = decisions + 1;
        let maintainability_index = maintainability(total_words, vocabulary.len(), cyclomatic, lines_of_code);

        Self {
            lines_of_code,
            cyclomatic,
            function_count,
            max_nesting,
            maintainability_index,
        }
    }
}

fn maintainability(total_words: usize, unique_words: usize, cyclomatic: usize, loc: usize) -> f64 {
    if loc == 0 {
        return 100.0;
    }
    let volume = if unique_words > 1 {
        total_words as f64 * (unique_words as f64).log2()
    } else {
        total_words as f64
    };
    let raw = 171.0
        - 5.2 * volume.max(1.0).ln()
        - 0.23 * cyclomatic as f64
        - 16.2 * (loc as f64).ln();
    (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}

/// Unreachable code, endless loops, bare excepts and oversized units.
#[derive(Debug, Clone)]
pub struct LogicAnalyzer {
    bare_except: Regex,
    endless_while: Regex,
    loop_exit: Regex,
}

impl LogicAnalyzer {
    /// Compile the analyzer patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            bare_except: Regex::new(r"^\s*except\s*:")?,
            endless_while: Regex::new(r"^\s*while\s+(?:True|1)\s*:")?,
            loop_exit: Regex::new(r"\b(?:break|return|raise)\b|sys\.exit\(|\bexit\(")?,
        })
    }

    fn unreachable(&self, lines: &[&str], findings: &mut Vec<Finding>) {
        for (index, line) in lines.iter().enumerate() {
            if is_comment_or_blank(line) || !starts_with_terminator(line.trim_start()) {
                continue;
            }
            let indent = indent_width(line);
            let next = lines
                .iter()
                .enumerate()
                .skip(index + 1)
                .find(|(_, candidate)| !is_comment_or_blank(candidate));

            if let Some((next_index, next_line)) = next {
                let trimmed = next_line.trim_start();
                let continues_block = BLOCK_CONTINUATIONS
                    .iter()
                    .any(|keyword| trimmed.starts_with(keyword));
                if indent_width(next_line) == indent && !continues_block {
                    findings.push(
                        Finding::new(
                            KIND,
                            "UNREACHABLE_CODE",
                            Severity::Medium,
                            format!("Code after '{}' on line {} never runs", first_word(line), index + 1),
                            0.7,
                        )
                        .at_line(next_index + 1)
                        .with_suggestion("Remove the dead code or move it before the exit"),
                    );
                }
            }
        }
    }

    fn endless_loops(&self, lines: &[&str], findings: &mut Vec<Finding>) {
        for (index, line) in lines.iter().enumerate() {
            if !self.endless_while.is_match(line) {
                continue;
            }
            let indent = indent_width(line);
            let exits = lines
                .iter()
                .skip(index + 1)
                .filter(|body| !body.trim().is_empty())
                .take_while(|body| indent_width(body) > indent)
                .any(|body| self.loop_exit.is_match(body));

            if !exits {
                findings.push(
                    Finding::new(
                        KIND,
                        "INFINITE_LOOP",
                        Severity::High,
                        "Loop has no break, return or raise",
                        0.75,
                    )
                    .at_line(index + 1)
                    .with_suggestion("Add an exit condition"),
                );
            }
        }
    }

    fn bare_excepts(&self, lines: &[&str], findings: &mut Vec<Finding>) {
        for (index, line) in lines.iter().enumerate() {
            if self.bare_except.is_match(line) {
                findings.push(
                    Finding::new(
                        KIND,
                        "BARE_EXCEPT",
                        Severity::Medium,
                        "Bare except catches every exception, including KeyboardInterrupt",
                        0.9,
                    )
                    .at_line(index + 1)
                    .with_suggestion("Catch specific exception types"),
                );
            }
        }
    }
}

fn starts_with_terminator(trimmed: &str) -> bool {
    TERMINATORS.iter().any(|keyword| {
        trimmed.strip_prefix(keyword).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with([' ', ';', '(', '\t'])
        })
    })
}

fn first_word(line: &str) -> &str {
    line.split_whitespace()
        .next()
        .map(|word| word.trim_end_matches([';', '(']))
        .unwrap_or_default()
}

#[async_trait]
impl RuleEvaluator for LogicAnalyzer {
    fn name(&self) -> &str {
        KIND
    }

    async fn evaluate(&self, record: &ContentRecord) -> Result<Vec<Finding>> {
        let lines: Vec<&str> = record.text.lines().collect();
        let mut findings = Vec::new();
        let is_python = record.language.as_deref() == Some("python");

        self.unreachable(&lines, &mut findings);
        if is_python {
            self.endless_loops(&lines, &mut findings);
            self.bare_excepts(&lines, &mut findings);
        }

        let metrics = ComplexityMetrics::measure(&record.text);
        if metrics.function_count > GOD_CLASS_FUNCTIONS {
            findings.push(Finding::new(
                KIND,
                "GOD_CLASS",
                Severity::Medium,
                format!(
                    "{} function definitions in one unit (limit {GOD_CLASS_FUNCTIONS})",
                    metrics.function_count
                ),
                0.6,
            ).with_suggestion("Split the unit into smaller, focused modules"));
        }
        if metrics.cyclomatic > HIGH_COMPLEXITY {
            findings.push(Finding::new(
                KIND,
                "HIGH_COMPLEXITY",
                Severity::Medium,
                format!("Cyclomatic complexity {} exceeds {HIGH_COMPLEXITY}", metrics.cyclomatic),
                0.7,
            ));
        }

        sort_by_line(&mut findings);
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::ContentCategory;

    fn python(text: &str) -> ContentRecord {
        ContentRecord::new("sample.py", ContentCategory::Code, text).with_language("python")
    }

    #[tokio::test]
    async fn detects_unreachable_statement() {
        let analyzer = LogicAnalyzer::new().unwrap();
        let text = "def f(x):\n    return x\n    print('never')\n";
        let findings = analyzer.evaluate(&python(text)).await.unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule_id, "UNREACHABLE_CODE");
        assert_eq!(findings[0].line(), Some(3));
    }

    #[tokio::test]
    async fn else_after_return_is_reachable() {
        let analyzer = LogicAnalyzer::new().unwrap();
        let text = "def f(x):\n    if x:\n        return 1\n    else:\n        return 2\n";
        let findings = analyzer.evaluate(&python(text)).await.unwrap();
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[tokio::test]
    async fn while_true_without_exit() {
        let analyzer = LogicAnalyzer::new().unwrap();
        let endless = "while True:\n    poll()\n";
        let bounded = "while True:\n    if done():\n        break\n";

        let findings = analyzer.evaluate(&python(endless)).await.unwrap();
        assert_eq!(findings[0].rule_id, "INFINITE_LOOP");
        assert_eq!(findings[0].severity, Severity::High);

        assert!(analyzer.evaluate(&python(bounded)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bare_except_and_god_class() {
        let analyzer = LogicAnalyzer::new().unwrap();
        let mut text = String::from("try:\n    go()\nexcept:\n    pass\n");
        for i in 0..21 {
            text.push_str(&format!("def f{i}():\n    pass\n"));
        }
        let findings = analyzer.evaluate(&python(&text)).await.unwrap();
        let ids: Vec<&str> = findings.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(ids.contains(&"BARE_EXCEPT"));
        assert!(ids.contains(&"GOD_CLASS"));
    }

    #[test]
    fn metrics_count_decisions_and_functions() {
        let metrics = ComplexityMetrics::measure(
            "def f(a, b):\n    if a and b:\n        return 1\n    for x in a:\n        pass\n",
        );
        assert_eq!(metrics.lines_of_code, 5);
        assert_eq!(metrics.function_count, 1);
        // if, and, for
        assert_eq!(metrics.cyclomatic, 4);
        assert_eq!(metrics.max_nesting, 2);
        assert!(metrics.maintainability_index > 0.0 && metrics.maintainability_index <= 100.0);
    }

    #[test]
    fn empty_text_is_perfectly_maintainable() {
        let metrics = ComplexityMetrics::measure("");
        assert_eq!(metrics.cyclomatic, 1);
        assert_eq!(metrics.maintainability_index, 100.0);
    }
}
