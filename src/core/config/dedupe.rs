//! Near-duplicate merging configuration types.

use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

use super::validation::{validate_non_negative, validate_unit_range, validate_weights_sum};

/// Configuration for the deduplicating merger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DedupeConfig {
    /// Score a pair must strictly exceed to be merged
    #[serde(default = "DedupeConfig::default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Signal weights used by the similarity scorer
    #[serde(default)]
    pub weights: SimilarityWeights,

    /// Split merge groups by detected language as well as category
    #[serde(default = "DedupeConfig::default_group_by_language")]
    pub group_by_language: bool,
}

impl Default for DedupeConfig {
    /// Returns the default merge configuration.
    fn default() -> Self {
        Self {
            similarity_threshold: Self::default_similarity_threshold(),
            weights: SimilarityWeights::default(),
            group_by_language: Self::default_group_by_language(),
        }
    }
}

impl DedupeConfig {
    const fn default_similarity_threshold() -> f64 {
        0.85
    }

    const fn default_group_by_language() -> bool {
        true
    }

    /// Validate merge configuration
    pub fn validate(&self) -> Result<()> {
        validate_unit_range(self.similarity_threshold, "dedupe.similarity_threshold")?;
        self.weights.validate()
    }
}

/// Weights for the three similarity signals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimilarityWeights {
    /// Token-set Jaccard overlap
    #[serde(default = "SimilarityWeights::default_structural")]
    pub structural: f64,
    /// Identifier-name overlap
    #[serde(default = "SimilarityWeights::default_semantic")]
    pub semantic: f64,
    /// Order-sensitive token sequence ratio
    #[serde(default = "SimilarityWeights::default_syntactic")]
    pub syntactic: f64,
}

impl Default for SimilarityWeights {
    /// Returns the default 0.4 / 0.4 / 0.2 weighting.
    fn default() -> Self {
        Self {
            structural: Self::default_structural(),
            semantic: Self::default_semantic(),
            syntactic: Self::default_syntactic(),
        }
    }
}

impl SimilarityWeights {
    const fn default_structural() -> f64 {
        0.4
    }

    const fn default_semantic() -> f64 {
        0.4
    }

    const fn default_syntactic() -> f64 {
        0.2
    }

    /// Validate weight values
    pub fn validate(&self) -> Result<()> {
        validate_non_negative(self.structural, "dedupe.weights.structural")?;
        validate_non_negative(self.semantic, "dedupe.weights.semantic")?;
        validate_non_negative(self.syntactic, "dedupe.weights.syntactic")?;
        validate_weights_sum(
            &[self.structural, self.semantic, self.syntactic],
            0.01,
            "dedupe.weights",
        )
    }
}
