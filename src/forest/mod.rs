//! Schema Forest
//!
//! Materializes discovery definitions into one expanded tree per API type.
//! The build runs as a chain of stages, each consuming the previous forest:
//!
//! ```text
//! DefinitionIndex
//!   -> build_forest          one tree per definition, each $ref expanded once per build
//!   -> resolve_refs          ref placeholders replaced by copies of the target root
//!   -> resolve_array_items   array nodes take the fields of their element type
//!   -> collapse_levels       ref -> wrapper -> fields becomes ref -> fields
//!   -> assign_identities     fresh display token on every node
//! ```
//!
//! All mutable build state (visited refs, ref cache, issued tokens) lives in a
//! caller-owned [`BuildContext`]. Independent snapshots never share one.
//! A finished [`Forest`] is read-only; queries take `&self`.

pub mod builder;
pub mod collapse;
pub mod gvk;
pub mod identity;
pub mod node;
pub mod query;
pub mod resolver;

pub use builder::{build_forest, TreeBuilder};
pub use collapse::{collapse, collapse_levels};
pub use gvk::Gvk;
pub use identity::{assign_identities, IdentityAssigner};
pub use node::{TreeNode, MISSING_DEFINITION};
pub use query::{GvkMatch, MatchTier, RootSummary, SearchResult};
pub use resolver::{resolve_array_items, resolve_refs, RefResolver};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::checksum::Checksum;
use crate::config::{BuildConfig, OutputFormat};
use crate::document::DefinitionIndex;
use crate::error::Result;
use crate::graph::RefGraph;

/// Mutable state threaded through one forest build
#[derive(Debug, Default)]
pub struct BuildContext {
    /// Refs already expanded by the tree builder, across the whole forest
    pub(crate) visited_refs: HashSet<String>,
    /// Deep copies of resolved ref targets, keyed by the full `$ref` string
    pub(crate) ref_cache: HashMap<String, TreeNode>,
    /// Display tokens handed out so far
    pub(crate) issued: HashSet<String>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visited(&self, reference: &str) -> bool {
        self.visited_refs.contains(reference)
    }

    pub fn visited_count(&self) -> usize {
        self.visited_refs.len()
    }

    pub fn cached(&self, reference: &str) -> Option<&TreeNode> {
        self.ref_cache.get(reference)
    }

    pub fn cached_count(&self) -> usize {
        self.ref_cache.len()
    }
}

/// Build statistics
#[derive(Debug, Clone, Serialize)]
pub struct ForestSummary {
    pub snapshot: Option<Checksum>,
    pub built_at: DateTime<Utc>,
    pub roots: usize,
    pub nodes: usize,
    pub skipped: usize,
}

/// The set of materialized trees for one discovery snapshot
#[derive(Debug, Clone)]
pub struct Forest {
    pub(crate) roots: Vec<TreeNode>,
    pub(crate) snapshot: Option<Checksum>,
    pub(crate) built_at: DateTime<Utc>,
    pub(crate) skipped: usize,
}

impl Forest {
    /// Wrap a set of roots, in the order they should be queried
    pub fn from_roots(roots: Vec<TreeNode>) -> Self {
        Self {
            roots,
            snapshot: None,
            built_at: Utc::now(),
            skipped: 0,
        }
    }

    /// Decode a raw discovery document and run every build stage
    pub fn build(raw: &[u8], config: &BuildConfig) -> Result<Self> {
        config.validate()?;
        let index = DefinitionIndex::parse_with(raw, config.strict)?;
        let mut forest = Self::from_index(&index, config)?;
        forest.snapshot = Some(Checksum::from_bytes(raw));

        info!(
            roots = forest.roots.len(),
            nodes = forest.node_count(),
            skipped = forest.skipped,
            snapshot = forest.snapshot.as_ref().map(Checksum::short).unwrap_or(""),
            "schema forest built"
        );
        Ok(forest)
    }

    /// Run every build stage over an existing index with a fresh context
    pub fn from_index(index: &DefinitionIndex, config: &BuildConfig) -> Result<Self> {
        config.validate()?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let graph = RefGraph::from_index(index);
            debug!(
                edges = graph.edge_count(),
                cycles = graph.cycles().len(),
                missing = graph.missing_targets().len(),
                "reference graph analyzed"
            );
        }

        let mut ctx = BuildContext::new();
        let forest = build_forest(index, &mut ctx);
        let forest = resolve_refs(forest, &mut ctx);
        let forest = resolve_array_items(forest, &mut ctx);
        let forest = collapse_levels(forest);
        let mut forest = assign_identities(forest, &mut ctx, config.token_length);
        forest.skipped = index.skipped().len();
        Ok(forest)
    }

    /// Root nodes in document order
    pub fn roots(&self) -> &[TreeNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<TreeNode> {
        self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total node count across every tree
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(TreeNode::node_count).sum()
    }

    pub fn snapshot(&self) -> Option<&Checksum> {
        self.snapshot.as_ref()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn summary(&self) -> ForestSummary {
        ForestSummary {
            snapshot: self.snapshot.clone(),
            built_at: self.built_at,
            roots: self.roots.len(),
            nodes: self.node_count(),
            skipped: self.skipped,
        }
    }

    /// Serialize the roots for a tree widget
    pub fn to_json(&self, format: OutputFormat) -> Result<String> {
        let json = match format {
            OutputFormat::Pretty => serde_json::to_string_pretty(&self.roots)?,
            OutputFormat::Compact => serde_json::to_string(&self.roots)?,
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Vec<u8> {
        serde_json::to_vec(&json!({
            "definitions": {
                "additional_properties": [
                    {
                        "name": "io.k8s.api.core.v1.Pod",
                        "value": {
                            "type": { "value": ["object"] },
                            "properties": { "additional_properties": [
                                { "name": "spec", "value": { "_ref": "#/definitions/io.k8s.api.core.v1.PodSpec" } }
                            ] }
                        }
                    },
                    {
                        "name": "io.k8s.api.core.v1.PodSpec",
                        "value": {
                            "properties": { "additional_properties": [
                                { "name": "hostname", "value": { "type": { "value": ["string"] } } }
                            ] }
                        }
                    }
                ]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_build_records_snapshot() {
        let raw = document();
        let forest = Forest::build(&raw, &BuildConfig::default()).unwrap();
        assert_eq!(forest.len(), 2);
        assert!(forest.snapshot().unwrap().verify(&raw));

        let summary = forest.summary();
        assert_eq!(summary.roots, 2);
        assert_eq!(summary.nodes, forest.node_count());
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = BuildConfig {
            token_length: 5,
            strict: false,
        };
        assert!(Forest::build(&document(), &config).is_err());
    }

    #[test]
    fn test_to_json_formats() {
        let forest = Forest::build(&document(), &BuildConfig::default()).unwrap();
        let pretty = forest.to_json(OutputFormat::Pretty).unwrap();
        let compact = forest.to_json(OutputFormat::Compact).unwrap();
        assert!(pretty.contains('\n'));
        assert!(!compact.contains('\n'));

        let parsed: Vec<TreeNode> = serde_json::from_str(&compact).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, "io.k8s.api.core.v1.Pod");
    }
}
