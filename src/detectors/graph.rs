//! Dependency graph between canonical records.
//!
//! An edge `a -> b` exists when one of `a`'s extracted dependencies names
//! `b`'s module stem (the file name without extension).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::record::CanonicalRecord;

/// One record in the graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DependencyNode {
    /// Record identity
    pub id: String,
    /// Record language
    pub language: Option<String>,
    /// Extracted dependencies
    pub dependencies: Vec<String>,
}

/// A resolved dependency between two records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Importing record
    pub from: String,
    /// Imported record
    pub to: String,
    /// Dependency string that resolved to `to`
    pub via: String,
}

/// Records and the dependencies resolved between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DependencyGraph {
    /// One node per canonical record
    pub nodes: Vec<DependencyNode>,
    /// Resolved edges
    pub edges: Vec<DependencyEdge>,
}

impl DependencyGraph {
    /// Build the graph. Without `cross_language`, edges only join records of
    /// the same language.
    pub fn build(records: &[CanonicalRecord], cross_language: bool) -> Self {
        let nodes: Vec<DependencyNode> = records
            .iter()
            .map(|canonical| DependencyNode {
                id: canonical.identity().to_string(),
                language: canonical.representative.language.clone(),
                dependencies: canonical.representative.dependencies.iter().cloned().collect(),
            })
            .collect();

        let stems: Vec<Option<String>> = nodes.iter().map(|node| module_stem(&node.id)).collect();

        let mut edges = Vec::new();
        for (from_index, from) in nodes.iter().enumerate() {
            for dependency in &from.dependencies {
                let segments = dependency_segments(dependency);
                for (to_index, to) in nodes.iter().enumerate() {
                    if to_index == from_index {
                        continue;
                    }
                    if !cross_language && from.language != to.language {
                        continue;
                    }
                    let Some(stem) = &stems[to_index] else {
                        continue;
                    };
                    if segments.contains(stem.as_str()) {
                        edges.push(DependencyEdge {
                            from: from.id.clone(),
                            to: to.id.clone(),
                            via: dependency.clone(),
                        });
                    }
                }
            }
        }

        Self { nodes, edges }
    }

    /// Identities of records that depend on `id`.
    pub fn dependents_of(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|edge| edge.to == id)
            .map(|edge| edge.from.as_str())
            .collect()
    }
}

fn module_stem(identity: &str) -> Option<String> {
    Path::new(identity)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.starts_with('<'))
        .map(str::to_ascii_lowercase)
}

fn dependency_segments(dependency: &str) -> BTreeSet<String> {
    dependency
        .split(|c: char| matches!(c, '.' | '/' | ':' | '\\' | '@'))
        .filter(|segment| !segment.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::{ContentCategory, ContentRecord};

    fn canonical(identity: &str, language: &str, deps: &[&str]) -> CanonicalRecord {
        CanonicalRecord::passthrough(
            ContentRecord::new(identity, ContentCategory::Code, "x")
                .with_language(language)
                .with_dependencies(deps.iter().copied()),
        )
    }

    #[test]
    fn resolves_module_stems() {
        let records = vec![
            canonical("src/app.py", "python", &["utils", "os"]),
            canonical("src/utils.py", "python", &[]),
            canonical("web/main.js", "javascript", &["./utils"]),
        ];
        let graph = DependencyGraph::build(&records, true);

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert_eq!(graph.dependents_of("src/utils.py"), vec!["src/app.py", "web/main.js"]);
    }

    #[test]
    fn same_language_only_when_cross_language_disabled() {
        let records = vec![
            canonical("web/main.js", "javascript", &["./utils"]),
            canonical("src/utils.py", "python", &[]),
        ];
        let graph = DependencyGraph::build(&records, false);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn raw_records_never_resolve() {
        let records = vec![
            canonical("<string>", "python", &["string"]),
            canonical("a.py", "python", &["string"]),
        ];
        assert!(DependencyGraph::build(&records, true).edges.is_empty());
    }
}
