//! Near-duplicate detection and merging.
//!
//! Records are partitioned into merge groups by category (and language when
//! known). Inside a group every unclaimed record claims the later unclaimed
//! records that score strictly above the similarity threshold. Each cluster
//! becomes one [`CanonicalRecord`] whose representative is the longest member.
//!
//! Comparison is quadratic per group. Expected inputs are tens to low
//! hundreds of records per run.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::similarity::{SimilarityScorer, TextProfile};
use crate::core::config::DedupeConfig;
use crate::core::errors::Result;
use crate::core::record::{CanonicalRecord, ContentCategory, ContentRecord};

/// Records sharing a category (and optionally a language).
#[derive(Debug, Clone)]
pub struct MergeGroup<'a> {
    /// Shared category
    pub category: ContentCategory,
    /// Shared language, when grouping by language
    pub language: Option<String>,
    /// Members with their position in the original input
    pub members: Vec<(usize, &'a ContentRecord)>,
}

/// Summary of a merge pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MergeStats {
    /// Records received
    pub input_records: usize,
    /// Groups formed
    pub groups: usize,
    /// Pairwise comparisons performed
    pub comparisons: usize,
    /// Records absorbed into another record's cluster
    pub duplicates_collapsed: usize,
}

/// Collapses near-duplicate records into canonical representatives.
#[derive(Debug, Clone)]
pub struct DeduplicatingMerger {
    scorer: SimilarityScorer,
    threshold: f64,
    group_by_language: bool,
}

impl DeduplicatingMerger {
    /// Build a merger from configuration.
    pub fn new(config: &DedupeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scorer: SimilarityScorer::new(config.weights)?,
            threshold: config.similarity_threshold,
            group_by_language: config.group_by_language,
        })
    }

    /// Duplication threshold in use.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scorer in use.
    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Partition records into merge groups, in first-seen order.
    pub fn partition<'a>(&self, records: &'a [ContentRecord]) -> Vec<MergeGroup<'a>> {
        let mut groups: IndexMap<(ContentCategory, Option<String>), Vec<(usize, &'a ContentRecord)>> =
            IndexMap::new();

        for (index, record) in records.iter().enumerate() {
            let language = if self.group_by_language {
                record.language.clone()
            } else {
                None
            };
            groups
                .entry((record.category, language))
                .or_default()
                .push((index, record));
        }

        groups
            .into_iter()
            .map(|((category, language), members)| MergeGroup {
                category,
                language,
                members,
            })
            .collect()
    }

    /// Merge records into canonical records.
    pub fn merge(&self, records: &[ContentRecord]) -> Vec<CanonicalRecord> {
        self.merge_with_stats(records).0
    }

    /// Merge records and report what happened.
    pub fn merge_with_stats(&self, records: &[ContentRecord]) -> (Vec<CanonicalRecord>, MergeStats) {
        let groups = self.partition(records);
        let group_count = groups.len();

        let merged: Vec<(Vec<CanonicalRecord>, usize)> = groups
            .par_iter()
            .map(|group| self.merge_group(group))
            .collect();

        let mut stats = MergeStats {
            input_records: records.len(),
            groups: group_count,
            ..MergeStats::default()
        };
        let mut canonical = Vec::with_capacity(records.len());
        for (group_records, comparisons) in merged {
            stats.comparisons += comparisons;
            canonical.extend(group_records);
        }
        stats.duplicates_collapsed = records.len() - canonical.len();

        debug!(
            "Merged {} records into {} canonical records across {} groups",
            stats.input_records,
            canonical.len(),
            stats.groups
        );

        (canonical, stats)
    }

    fn merge_group(&self, group: &MergeGroup<'_>) -> (Vec<CanonicalRecord>, usize) {
        let profiles: Vec<TextProfile> = group
            .members
            .par_iter()
            .map(|(_, record)| self.scorer.profile(&record.text))
            .collect();

        let mut claimed = vec![false; group.members.len()];
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        let mut comparisons = 0usize;

        for i in 0..group.members.len() {
            if claimed[i] {
                continue;
            }
            claimed[i] = true;
            let mut cluster = vec![i];

            for j in (i + 1)..group.members.len() {
                if claimed[j] {
                    continue;
                }
                comparisons += 1;
                let score = self.scorer.score_profiles(&profiles[i], &profiles[j]);
                if score > self.threshold {
                    debug!(
                        "{} absorbs {} (similarity {:.3})",
                        group.members[i].1.identity, group.members[j].1.identity, score
                    );
                    claimed[j] = true;
                    cluster.push(j);
                }
            }

            clusters.push(cluster);
        }

        let canonical = clusters
            .into_iter()
            .map(|cluster| self.canonicalize(group, &cluster))
            .collect();

        (canonical, comparisons)
    }

    fn canonicalize(&self, group: &MergeGroup<'_>, cluster: &[usize]) -> CanonicalRecord {
        let mut members: Vec<(usize, &ContentRecord)> =
            cluster.iter().map(|&slot| group.members[slot]).collect();
        members.sort_by_key(|(input_index, _)| *input_index);

        // Strict comparison keeps the earliest member on equal lengths.
        let mut representative = members[0].1;
        for (_, record) in members.iter().skip(1) {
            if record.text.len() > representative.text.len() {
                representative = record;
            }
        }

        CanonicalRecord {
            representative: representative.clone(),
            provenance: members
                .iter()
                .map(|(_, record)| record.identity.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merger() -> DeduplicatingMerger {
        DeduplicatingMerger::new(&DedupeConfig::default()).unwrap()
    }

    fn python(identity: &str, text: &str) -> ContentRecord {
        ContentRecord::new(identity, ContentCategory::Code, text).with_language("python")
    }

    const TOTAL_A: &str = "def compute_total(items, tax_rate):
    subtotal = 0
    for item in items:
        subtotal += item.price * item.quantity
    discount = subtotal * 0.1 if subtotal > 100 else 0
    total = (subtotal - discount) * (1 + tax_rate)
    return round(total, 2)
";

    const TOTAL_B: &str = "def compute_total(items, tax_rate):
    running = 0
    for item in items:
        running += item.price * item.quantity
    discount = running * 0.1 if running > 100 else 0
    total = (running - discount) * (1 + tax_rate)
    return round(total, 2)
";

    #[test]
    fn comment_copy_collapses_to_longer_text() {
        let records = vec![
            python("a.py", "def f(): return 1"),
            python("b.py", "def f(): return 1  # copy"),
        ];
        let merged = merger().merge(&records);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].provenance, vec!["a.py", "b.py"]);
        assert_eq!(merged[0].representative.text, "def f(): return 1  # copy");
    }

    #[test]
    fn renamed_variables_collapse() {
        let records = vec![python("a.py", TOTAL_A), python("b.py", TOTAL_B)];
        let score = merger().scorer().score(TOTAL_A, TOTAL_B);
        assert!(score > 0.85, "score was {score}");

        let merged = merger().merge(&records);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].provenance, vec!["a.py", "b.py"]);
    }

    #[test]
    fn dissimilar_records_pass_through() {
        let records = vec![
            python("a.py", "def alpha(x): return x + 1"),
            python("b.py", "def beta(items): return sorted(items)"),
            python("c.py", "class Gamma:\n    pass"),
        ];
        let merged = merger().merge(&records);

        assert_eq!(merged.len(), 3);
        for (canonical, original) in merged.iter().zip(&records) {
            assert_eq!(canonical.provenance, vec![original.identity.clone()]);
            assert_eq!(&canonical.representative, original);
        }
    }

    #[test]
    fn categories_never_mix() {
        let records = vec![
            ContentRecord::new("a.md", ContentCategory::Document, "same words here"),
            ContentRecord::new("a.txt", ContentCategory::Data, "same words here"),
        ];
        let merged = merger().merge(&records);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn languages_split_groups_when_enabled() {
        let records = vec![
            python("a.py", "def f(): return 1"),
            ContentRecord::new("a.rb", ContentCategory::Code, "def f(): return 1")
                .with_language("ruby"),
        ];
        assert_eq!(merger().merge(&records).len(), 2);

        let config = DedupeConfig {
            group_by_language: false,
            ..DedupeConfig::default()
        };
        let merger = DeduplicatingMerger::new(&config).unwrap();
        assert_eq!(merger.merge(&records).len(), 1);
    }

    #[test]
    fn equal_length_tie_keeps_earliest() {
        let records = vec![
            python("first.py", "def f(): return 1  # aa"),
            python("second.py", "def f(): return 1  # bb"),
        ];
        let merged = merger().merge(&records);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].representative.identity, "first.py");
    }

    #[test]
    fn threshold_is_strict() {
        let config = DedupeConfig {
            similarity_threshold: 1.0,
            ..DedupeConfig::default()
        };
        let merger = DeduplicatingMerger::new(&config).unwrap();
        let records = vec![python("a.py", "def f(): pass"), python("b.py", "def f(): pass")];
        assert_eq!(merger.merge(&records).len(), 2);
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let records = vec![
            ContentRecord::new("doc.md", ContentCategory::Document, "# Title"),
            python("a.py", "def alpha(): pass"),
            ContentRecord::new("more.md", ContentCategory::Document, "# Other"),
        ];
        let merger = merger();
        let groups = merger.partition(&records);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, ContentCategory::Document);
        assert_eq!(groups[0].members.len(), 2);

        let (merged, stats) = merger.merge_with_stats(&records);
        let identities: Vec<&str> = merged.iter().map(CanonicalRecord::identity).collect();
        assert_eq!(identities, vec!["doc.md", "more.md", "a.py"]);
        assert_eq!(stats.groups, 2);
        assert_eq!(stats.comparisons, 1);
        assert_eq!(stats.duplicates_collapsed, 0);
    }
}
