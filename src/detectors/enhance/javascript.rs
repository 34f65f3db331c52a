//! JavaScript and TypeScript rewrites.
//!
//! Rewrites on the same line are chained: each proposal's `before_text` is
//! the previous proposal's `after_text`, so applying them in order composes.

use async_trait::async_trait;
use regex::Regex;

use crate::core::errors::Result;
use crate::core::record::{ContentRecord, Enhancement, EnhancementKind, Finding, Level};
use crate::detectors::rules::{Enhancer, JS_FAMILY};

/// JavaScript-family enhancer.
#[derive(Debug, Clone)]
pub struct JavaScriptEnhancer {
    var_declaration: Regex,
    loose_equal: Regex,
    loose_not_equal: Regex,
    length_loop: Regex,
}

impl JavaScriptEnhancer {
    /// Compile the rewrite patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            var_declaration: Regex::new(r"^(\s*)var\s+")?,
            loose_equal: Regex::new(r"([^=!<>])==([^=])")?,
            loose_not_equal: Regex::new(r"!=([^=])")?,
            length_loop: Regex::new(
                r"^(\s*)for\s*\(\s*(let|var)\s+(\w+)\s*=\s*0\s*;\s*(\w+)\s*<\s*([\w$.]+)\.length\s*;(.*)$",
            )?,
        })
    }

    fn rewrite_line(&self, line: &str, number: usize, proposals: &mut Vec<Enhancement>) {
        let mut current = line.to_string();

        if let Some(caps) = self.length_loop.captures(&current) {
            if caps[3] == caps[4] {
                let after = format!(
                    "{}for ({} {} = 0, len = {}.length; {} < len;{}",
                    &caps[1], &caps[2], &caps[3], &caps[5], &caps[3], &caps[6]
                );
                push(
                    proposals,
                    Enhancement::new(
                        EnhancementKind::Optimization,
                        "performance",
                        "Cache the array length outside the loop condition",
                        0.7,
                        after,
                    )
                    .with_levels(Level::Low, Level::Low),
                    &mut current,
                    number,
                );
            }
        }

        if self.var_declaration.is_match(&current) {
            let after = self.var_declaration.replace(&current, "${1}let ").into_owned();
            push(
                proposals,
                Enhancement::new(
                    EnhancementKind::Refactor,
                    "style",
                    "Use block-scoped 'let' instead of 'var'",
                    0.9,
                    after,
                )
                .with_levels(Level::Low, Level::Low),
                &mut current,
                number,
            );
        }

        if self.loose_equal.is_match(&current) || self.loose_not_equal.is_match(&current) {
            let strict = self.loose_equal.replace_all(&current, "${1}===${2}");
            let after = self
                .loose_not_equal
                .replace_all(&strict, "!==${1}")
                .into_owned();
            push(
                proposals,
                Enhancement::new(
                    EnhancementKind::Fix,
                    "correctness",
                    "Use strict equality to avoid type coercion",
                    0.75,
                    after,
                )
                .with_levels(Level::Medium, Level::Medium),
                &mut current,
                number,
            );
        }
    }
}

fn push(proposals: &mut Vec<Enhancement>, enhancement: Enhancement, current: &mut String, line: usize) {
    let after = enhancement.after_text.clone();
    proposals.push(enhancement.with_before(current.as_str()).at_line(line));
    *current = after;
}

#[async_trait]
impl Enhancer for JavaScriptEnhancer {
    fn name(&self) -> &str {
        "javascript"
    }

    async fn propose(&self, record: &ContentRecord, _findings: &[Finding]) -> Result<Vec<Enhancement>> {
        let is_js = record
            .language
            .as_deref()
            .is_some_and(|language| JS_FAMILY.contains(&language));
        if !is_js {
            return Ok(Vec::new());
        }

        let mut proposals = Vec::new();
        for (index, line) in record.text.lines().enumerate() {
            self.rewrite_line(line, index + 1, &mut proposals);
        }
        Ok(proposals)
    }
}
