//! Regex-substitution enhancers and the logic that applies their output.
//!
//! Every built-in enhancer proposes whole-line replacements: `before_text`
//! holds the original line and `after_text` the rewritten one. Applying is
//! therefore a line lookup, and a proposal whose original no longer matches
//! is skipped instead of corrupting the text.

pub mod general;
pub mod javascript;
pub mod python;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::Result;
use crate::core::record::Enhancement;
use crate::detectors::rules::Enhancer;

pub use general::{RustCloneEnhancer, WhitespaceEnhancer};
pub use javascript::JavaScriptEnhancer;
pub use python::PythonEnhancer;

/// Built-in enhancers in registration order.
pub fn default_enhancers() -> Result<Vec<Arc<dyn Enhancer>>> {
    Ok(vec![
        Arc::new(PythonEnhancer::new()?),
        Arc::new(JavaScriptEnhancer::new()?),
        Arc::new(RustCloneEnhancer::new()?),
        Arc::new(WhitespaceEnhancer),
    ])
}

/// Keep the enhancements at or above `threshold` that satisfy the audit
/// invariant. Rejected proposals are logged.
pub fn filter_enhancements(enhancements: Vec<Enhancement>, threshold: f64) -> Vec<Enhancement> {
    enhancements
        .into_iter()
        .filter(|enhancement| enhancement.confidence >= threshold)
        .filter(|enhancement| match enhancement.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping enhancement '{}': {}", enhancement.description, e);
                false
            }
        })
        .collect()
}

/// Text after applying enhancements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppliedText {
    /// Rewritten text
    pub text: String,
    /// Enhancements applied
    pub applied: usize,
    /// Enhancements skipped because their line had already changed
    pub skipped: usize,
}

/// Split `text` into (body, terminator) pairs; the terminator is `\r\n`,
/// `\n`, or empty on an unterminated last line.
fn split_terminated(text: &str) -> Vec<(String, &str)> {
    text.split_inclusive('\n')
        .map(|line| {
            let body = line
                .strip_suffix("\r\n")
                .or_else(|| line.strip_suffix('\n'))
                .unwrap_or(line);
            (body.to_string(), &line[body.len()..])
        })
        .collect()
}

/// Apply line-anchored enhancements to `text`, in line order. Line
/// terminators are kept as they were.
pub fn apply_enhancements(text: &str, enhancements: &[Enhancement]) -> AppliedText {
    let mut lines = split_terminated(text);
    let mut ordered: Vec<&Enhancement> = enhancements.iter().collect();
    ordered.sort_by_key(|enhancement| enhancement.line.unwrap_or(0));

    let mut applied = 0;
    let mut skipped = 0;
    for enhancement in ordered {
        let (Some(line), Some(before)) = (enhancement.line, enhancement.before_text.as_deref())
        else {
            skipped += 1;
            continue;
        };
        match lines.get_mut(line.wrapping_sub(1)) {
            Some((current, _)) if current == before => {
                *current = enhancement.after_text.clone();
                applied += 1;
            }
            _ => skipped += 1,
        }
    }

    let rewritten: String = lines
        .iter()
        .flat_map(|(body, terminator)| [body.as_str(), *terminator])
        .collect();

    AppliedText {
        text: rewritten,
        applied,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{EnhancementKind, Level};

    fn line_fix(line: usize, before: &str, after: &str, confidence: f64) -> Enhancement {
        Enhancement::new(EnhancementKind::Fix, "style", "rewrite", confidence, after)
            .with_before(before)
            .at_line(line)
    }

    #[test]
    fn applies_matching_lines_and_skips_conflicts() {
        let text = "a = 1 \nb = 2\n";
        let enhancements = vec![
            line_fix(1, "a = 1 ", "a = 1", 0.9),
            line_fix(1, "a = 1 ", "a=1", 0.9),
            line_fix(2, "b = 2", "b = 3", 0.9),
            line_fix(7, "nothing", "here", 0.9),
        ];
        let result = apply_enhancements(text, &enhancements);

        assert_eq!(result.text, "a = 1\nb = 3\n");
        assert_eq!(result.applied, 2);
        assert_eq!(result.skipped, 2);
    }

    #[test]
    fn keeps_crlf_and_missing_final_newline() {
        let text = "a = 1 \r\nb = 2\r\nc = 3";
        let enhancements = vec![
            line_fix(1, "a = 1 ", "a = 1", 0.9),
            line_fix(3, "c = 3", "c = 4", 0.9),
        ];
        let result = apply_enhancements(text, &enhancements);

        assert_eq!(result.text, "a = 1\r\nb = 2\r\nc = 4");
        assert_eq!(result.applied, 2);
    }

    #[test]
    fn untouched_text_is_returned_verbatim() {
        let text = "x\r\ny\n\r\nz\n";
        assert_eq!(apply_enhancements(text, &[]).text, text);
    }

    #[test]
    fn filter_applies_threshold_and_invariant() {
        let unsafe_fix = Enhancement::new(EnhancementKind::Fix, "security", "swap", 0.95, "x")
            .with_levels(Level::High, Level::High);
        let kept = filter_enhancements(
            vec![
                line_fix(1, "a", "b", 0.69),
                line_fix(1, "a", "b", 0.7),
                unsafe_fix,
            ],
            0.7,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].confidence, 0.7);
    }

    #[test]
    fn default_set_is_complete() {
        let names: Vec<String> = default_enhancers()
            .unwrap()
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["python", "javascript", "rust", "whitespace"]);
    }
}
