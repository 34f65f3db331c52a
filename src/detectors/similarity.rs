//! Weighted text similarity used by the deduplicating merger.
//!
//! Three signals are combined:
//!
//! - **structural**: Jaccard overlap of the cleaned, lower-cased token sets
//! - **semantic**: overlap of declared identifier names (`def`, `fn`, `function`, `class`)
//! - **syntactic**: `2·LCS / (|a| + |b|)` over the cleaned token sequences
//!
//! Cleaning strips line comments (`#`, `//`), block comments and quoted
//! string literals before tokenizing, so two blocks that differ only in
//! comments or literal contents score as identical.

use ahash::AHashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::config::SimilarityWeights;
use crate::core::errors::Result;
use crate::core::record::clamp_unit;

/// Semantic score used when either side declares no names.
pub const NEUTRAL_SEMANTIC_SCORE: f64 = 0.5;

/// Compiled cleaning and tokenizing patterns.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    block_comment: Regex,
    line_comment: Regex,
    string_literal: Regex,
    word: Regex,
    declared_name: Regex,
}

impl Tokenizer {
    /// Compile the tokenizer patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            block_comment: Regex::new(r"(?s)/\*.*?\*/")?,
            line_comment: Regex::new(r"(?m)(#|//).*$")?,
            string_literal: Regex::new(r#""(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'"#)?,
            word: Regex::new(r"\w+")?,
            declared_name: Regex::new(r"\b(?:def|function|fn|class)\s+(\w+)")?,
        })
    }

    /// Strip comments and string literals, then split into lower-case word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let without_blocks = self.block_comment.replace_all(text, " ");
        let without_comments = self.line_comment.replace_all(&without_blocks, "");
        let cleaned = self.string_literal.replace_all(&without_comments, " ");
        self.word
            .find_iter(&cleaned)
            .map(|token| token.as_str().to_lowercase())
            .collect()
    }

    /// Names introduced by `def`, `function`, `fn` or `class`.
    pub fn declared_names(&self, text: &str) -> AHashSet<String> {
        self.declared_name
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|name| name.as_str().to_string())
            .collect()
    }

    /// Build a reusable profile of `text`.
    pub fn profile(&self, text: &str) -> TextProfile {
        let tokens = self.tokenize(text);
        let token_set = tokens.iter().cloned().collect();
        TextProfile {
            tokens,
            token_set,
            names: self.declared_names(text),
        }
    }
}

/// Pre-tokenized view of one text, reusable across many comparisons.
#[derive(Debug, Clone, Default)]
pub struct TextProfile {
    tokens: Vec<String>,
    token_set: AHashSet<String>,
    names: AHashSet<String>,
}

impl TextProfile {
    /// Cleaned token sequence.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Declared identifier names.
    pub fn names(&self) -> &AHashSet<String> {
        &self.names
    }
}

/// Per-signal scores plus their weighted combination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityBreakdown {
    /// Token-set Jaccard overlap
    pub structural: f64,
    /// Identifier overlap
    pub semantic: f64,
    /// Token sequence ratio
    pub syntactic: f64,
    /// Weighted combination, clamped to [0, 1]
    pub combined: f64,
}

/// Weighted multi-signal similarity scorer.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
    tokenizer: Tokenizer,
}

impl SimilarityScorer {
    /// Create a scorer with explicit weights.
    pub fn new(weights: SimilarityWeights) -> Result<Self> {
        Ok(Self {
            weights,
            tokenizer: Tokenizer::new()?,
        })
    }

    /// Weights in use.
    pub fn weights(&self) -> SimilarityWeights {
        self.weights
    }

    /// Tokenize `text` once for repeated comparisons.
    pub fn profile(&self, text: &str) -> TextProfile {
        self.tokenizer.profile(text)
    }

    /// Similarity of two texts in [0, 1].
    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.score_profiles(&self.profile(a), &self.profile(b))
    }

    /// Similarity of two pre-tokenized texts in [0, 1].
    pub fn score_profiles(&self, a: &TextProfile, b: &TextProfile) -> f64 {
        self.breakdown_profiles(a, b).combined
    }

    /// Per-signal breakdown for two texts.
    pub fn breakdown(&self, a: &str, b: &str) -> SimilarityBreakdown {
        self.breakdown_profiles(&self.profile(a), &self.profile(b))
    }

    /// Per-signal breakdown for two pre-tokenized texts.
    pub fn breakdown_profiles(&self, a: &TextProfile, b: &TextProfile) -> SimilarityBreakdown {
        let structural = jaccard(&a.token_set, &b.token_set);
        let semantic = name_overlap(&a.names, &b.names);
        let syntactic = sequence_ratio(&a.tokens, &b.tokens);
        let combined = clamp_unit(
            self.weights.structural * structural
                + self.weights.semantic * semantic
                + self.weights.syntactic * syntactic,
        );

        SimilarityBreakdown {
            structural,
            semantic,
            syntactic,
            combined,
        }
    }
}

/// Jaccard similarity of two sets; 0 when either is empty.
fn jaccard(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

fn name_overlap(a: &AHashSet<String>, b: &AHashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return NEUTRAL_SEMANTIC_SCORE;
    }
    let common = a.intersection(b).count();
    common as f64 / a.len().max(b.len()) as f64
}

/// `2·LCS / (|a| + |b|)`; 0 when either sequence is empty.
fn sequence_ratio(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let lcs = lcs_length(a, b);
    (2 * lcs) as f64 / (a.len() + b.len()) as f64
}

fn lcs_length(a: &[String], b: &[String]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut previous = vec![0usize; short.len() + 1];
    let mut current = vec![0usize; short.len() + 1];

    for item in long {
        for (j, other) in short.iter().enumerate() {
            current[j + 1] = if item == other {
                previous[j] + 1
            } else {
                current[j].max(previous[j + 1])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(SimilarityWeights::default()).unwrap()
    }

    #[test]
    fn tokenize_strips_comments_and_literals() {
        let tokenizer = Tokenizer::new().unwrap();
        let tokens = tokenizer.tokenize("x = 'hello world'  # note\n/* block */ y // trailing");
        assert_eq!(tokens, vec!["x", "y"]);
    }

    #[test]
    fn tokenize_lowercases() {
        let tokenizer = Tokenizer::new().unwrap();
        assert_eq!(tokenizer.tokenize("Foo BAR"), vec!["foo", "bar"]);
    }

    #[test]
    fn declared_names_cover_common_keywords() {
        let tokenizer = Tokenizer::new().unwrap();
        let names = tokenizer.declared_names("def a():\nfunction b() {}\nfn c() {}\nclass D:");
        for name in ["a", "b", "c", "D"] {
            assert!(names.contains(name), "missing {name}");
        }
    }

    #[test]
    fn identical_text_scores_one() {
        let scorer = scorer();
        let text = "def add(a, b):\n    return a + b\n";
        assert_relative_eq!(scorer.score(text, text), 1.0);
    }

    #[test]
    fn comment_only_difference_scores_one() {
        let scorer = scorer();
        let score = scorer.score("def f(): return 1", "def f(): return 1  # copy");
        assert_relative_eq!(score, 1.0);
    }

    #[test]
    fn empty_inputs_use_neutral_semantic_prior() {
        let scorer = scorer();
        let breakdown = scorer.breakdown("", "");
        assert_eq!(breakdown.structural, 0.0);
        assert_eq!(breakdown.syntactic, 0.0);
        assert_eq!(breakdown.semantic, NEUTRAL_SEMANTIC_SCORE);
        assert_relative_eq!(breakdown.combined, 0.2);
    }

    #[test]
    fn disjoint_names_score_zero_semantic() {
        let scorer = scorer();
        let breakdown = scorer.breakdown("def alpha(): pass", "def beta(): pass");
        assert_eq!(breakdown.semantic, 0.0);
        // tokens: [def, alpha, pass] vs [def, beta, pass]
        assert_relative_eq!(breakdown.structural, 0.5);
        assert_relative_eq!(breakdown.syntactic, 2.0 * 2.0 / 6.0);
    }

    #[test]
    fn lcs_counts_ordered_matches() {
        let a: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        let b: Vec<String> = ["b", "d", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(lcs_length(&a, &b), 2);
        assert_eq!(lcs_length(&b, &a), 2);
    }

    #[test]
    fn weights_change_the_combination() {
        let scorer = SimilarityScorer::new(SimilarityWeights {
            structural: 1.0,
            semantic: 0.0,
            syntactic: 0.0,
        })
        .unwrap();
        assert_relative_eq!(scorer.score("a b", "a c"), 1.0 / 3.0);
    }

    proptest! {
        #[test]
        fn score_is_bounded_and_symmetric(a in "[a-z (){}:=+\n]{0,60}", b in "[a-z (){}:=+\n]{0,60}") {
            let scorer = scorer();
            let ab = scorer.score(&a, &b);
            let ba = scorer.score(&b, &a);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - ba).abs() < 1e-9);
        }
    }
}
