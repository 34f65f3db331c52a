//! Language-agnostic and Rust rewrites.

use std::collections::BTreeSet;

use async_trait::async_trait;
use regex::Regex;

use crate::core::errors::Result;
use crate::core::record::{ContentRecord, Enhancement, EnhancementKind, Finding, Level};
use crate::detectors::rules::Enhancer;

/// Drops `.clone()` on values that are immediately borrowed.
#[derive(Debug, Clone)]
pub struct RustCloneEnhancer {
    borrowed_clone: Regex,
}

impl RustCloneEnhancer {
    /// Compile the rewrite pattern.
    pub fn new() -> Result<Self> {
        Ok(Self {
            borrowed_clone: Regex::new(r"&(\w+(?:\.\w+)*)\.clone\(\)")?,
        })
    }
}

#[async_trait]
impl Enhancer for RustCloneEnhancer {
    fn name(&self) -> &str {
        "rust"
    }

    async fn propose(&self, record: &ContentRecord, _findings: &[Finding]) -> Result<Vec<Enhancement>> {
        if record.language.as_deref() != Some("rust") {
            return Ok(Vec::new());
        }

        Ok(record
            .text
            .lines()
            .enumerate()
            .filter(|(_, line)| self.borrowed_clone.is_match(line))
            .map(|(index, line)| {
                let after = self.borrowed_clone.replace_all(line, "&${1}").into_owned();
                Enhancement::new(
                    EnhancementKind::Refactor,
                    "performance",
                    "Borrow directly instead of cloning first",
                    0.7,
                    after,
                )
                .with_levels(Level::Low, Level::Low)
                .with_before(line)
                .at_line(index + 1)
            })
            .collect())
    }
}

/// Strips trailing whitespace on the lines the syntax analyzer flagged.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceEnhancer;

#[async_trait]
impl Enhancer for WhitespaceEnhancer {
    fn name(&self) -> &str {
        "whitespace"
    }

    async fn propose(&self, record: &ContentRecord, findings: &[Finding]) -> Result<Vec<Enhancement>> {
        let flagged: BTreeSet<usize> = findings
            .iter()
            .filter(|finding| finding.rule_id == "TRAILING_WHITESPACE")
            .filter_map(Finding::line)
            .collect();

        Ok(record
            .text
            .lines()
            .enumerate()
            .filter(|(index, _)| flagged.contains(&(index + 1)))
            .map(|(index, line)| {
                Enhancement::new(
                    EnhancementKind::Fix,
                    "style",
                    "Remove trailing whitespace",
                    0.99,
                    line.trim_end(),
                )
                .with_levels(Level::Low, Level::Low)
                .with_before(line)
                .at_line(index + 1)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{ContentCategory, Severity};

    #[tokio::test]
    async fn borrowed_clone_is_dropped() {
        let record = ContentRecord::new("lib.rs", ContentCategory::Code, "takes(&config.name.clone());\n")
            .with_language("rust");
        let proposals = RustCloneEnhancer::new().unwrap().propose(&record, &[]).await.unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].after_text, "takes(&config.name);");
    }

    #[tokio::test]
    async fn whitespace_follows_findings() {
        let record = ContentRecord::new("a.txt", ContentCategory::Document, "one  \ntwo  \n");
        let findings = vec![
            Finding::new("syntax", "TRAILING_WHITESPACE", Severity::Low, "ws", 0.9).at_line(2),
        ];
        let proposals = WhitespaceEnhancer.propose(&record, &findings).await.unwrap();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].line, Some(2));
        assert_eq!(proposals[0].after_text, "two");
    }
}
