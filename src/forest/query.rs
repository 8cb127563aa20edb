//! Read-only lookups over a finished forest
//!
//! GVK lookups fall back through progressively looser tiers and return the
//! first root of the most specific tier that matches. Within a tier, the
//! winner is whichever root comes first in document order; the discovery
//! endpoint does not promise a stable order, so callers should not rely on
//! which of several equally ranked roots they get.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;
use std::fmt;
use tracing::{info, trace};

use super::gvk::Gvk;
use super::node::TreeNode;
use super::Forest;

/// Which fallback tier produced a GVK match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// group, version and kind all equal
    Exact,
    /// version and kind equal, group ignored
    VersionKind,
    /// kind equal
    Kind,
    /// root label equal to the requested kind
    Label,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchTier::Exact => "group+version+kind",
            MatchTier::VersionKind => "version+kind",
            MatchTier::Kind => "kind",
            MatchTier::Label => "label",
        };
        f.write_str(name)
    }
}

/// A root found by GVK lookup
#[derive(Debug, Clone, Copy)]
pub struct GvkMatch<'a> {
    pub node: &'a TreeNode,
    pub tier: MatchTier,
}

/// Listing entry for one root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootSummary {
    pub id: String,
    pub label: String,
    pub group: String,
    pub version: String,
    pub kind: String,
}

/// Fuzzy search hit
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub label: String,
    pub score: i64,
}

impl Forest {
    /// First root whose label equals `label`
    pub fn fetch_by_label(&self, label: &str) -> Option<&TreeNode> {
        self.roots.iter().find(|root| root.label == label)
    }

    /// Root with exactly this fully-qualified id
    pub fn fetch_by_id(&self, id: &str) -> Option<&TreeNode> {
        self.roots.iter().find(|root| root.id == id)
    }

    /// Root for a manifest's `apiVersion` and `kind`
    pub fn fetch_by_gvk(&self, api_version: &str, kind: &str) -> Option<&TreeNode> {
        self.lookup_gvk(api_version, kind).map(|m| m.node)
    }

    /// Like [`Forest::fetch_by_gvk`], also reporting the tier that matched
    pub fn lookup_gvk(&self, api_version: &str, kind: &str) -> Option<GvkMatch<'_>> {
        let wanted = Gvk::from_api_version(api_version, kind);

        let tiers: [(MatchTier, fn(&Gvk, &Gvk) -> bool); 3] = [
            (MatchTier::Exact, |root, wanted| root == wanted),
            (MatchTier::VersionKind, |root, wanted| {
                root.version == wanted.version && root.kind == wanted.kind
            }),
            (MatchTier::Kind, |root, wanted| root.kind == wanted.kind),
        ];

        let found = tiers.iter().find_map(|(tier, matches)| {
            self.roots
                .iter()
                .find(|root| matches(&root.gvk, &wanted))
                .map(|node| GvkMatch { node, tier: *tier })
        });

        let found = found.or_else(|| {
            self.fetch_by_label(kind).map(|node| GvkMatch {
                node,
                tier: MatchTier::Label,
            })
        });

        match &found {
            Some(m) => trace!(
                api_version,
                kind,
                wanted = %wanted,
                id = %m.node.id,
                parsed = %m.node.gvk,
                tier = %m.tier,
                "gvk lookup hit"
            ),
            None => trace!(api_version, kind, wanted = %wanted, "gvk lookup miss"),
        }
        found
    }

    /// Every root with its parsed group/version/kind
    pub fn list_roots(&self) -> Vec<RootSummary> {
        self.roots
            .iter()
            .map(|root| RootSummary {
                id: root.id.clone(),
                label: root.label.clone(),
                group: root.gvk.group.clone(),
                version: root.gvk.version.clone(),
                kind: root.gvk.kind.clone(),
            })
            .collect()
    }

    /// Log one line per root, for diagnosing lookup surprises
    pub fn log_roots(&self) {
        for root in &self.roots {
            info!(id = %root.id, label = %root.label, gvk = %root.gvk, "forest root");
        }
    }

    /// Fuzzy match roots by label, then by id; best score first
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let matcher = SkimMatcherV2::default();
        let mut results: Vec<(i64, &TreeNode)> = Vec::new();

        for root in &self.roots {
            let score = matcher
                .fuzzy_match(&root.label, query)
                .or_else(|| matcher.fuzzy_match(&root.id, query));
            if let Some(score) = score {
                results.push((score, root));
            }
        }

        results.sort_by(|a, b| b.0.cmp(&a.0));

        results
            .into_iter()
            .take(limit)
            .map(|(score, root)| SearchResult {
                id: root.id.clone(),
                label: root.label.clone(),
                score,
            })
            .collect()
    }
}
