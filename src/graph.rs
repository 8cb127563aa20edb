//! Reference Graph
//!
//! Definition-level view of the `$ref` edges in a discovery document. The
//! forest build does not need it; it answers the questions that come up when
//! a tree looks shallower than expected: which types sit on a cycle, and which
//! refs point at nothing.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::document::{ref_target, DefinitionIndex, Property};

/// How one definition refers to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RefEdge {
    /// Property `_ref`
    Property,
    /// Array element `_ref`
    Items,
    /// `_ref` inside inline nested properties
    Nested,
}

/// A ref whose target is not defined
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MissingTarget {
    pub from: String,
    pub target: String,
}

pub struct RefGraph {
    graph: DiGraph<String, RefEdge>,
    node_indices: HashMap<String, NodeIndex>,
    missing: Vec<MissingTarget>,
}

impl RefGraph {
    pub fn from_index(index: &DefinitionIndex) -> Self {
        let mut graph = DiGraph::with_capacity(index.len(), index.len() * 3);
        let mut node_indices = HashMap::with_capacity(index.len());

        for def in index.iter() {
            if !node_indices.contains_key(&def.name) {
                let idx = graph.add_node(def.name.clone());
                node_indices.insert(def.name.clone(), idx);
            }
        }

        let mut pending: Vec<(String, String, RefEdge)> = Vec::new();
        for def in index.iter() {
            collect_refs(&def.name, def.properties(), false, &mut pending);
        }

        let mut missing = BTreeSet::new();
        for (from, target, kind) in pending {
            match (node_indices.get(&from), node_indices.get(&target)) {
                (Some(&from_idx), Some(&to_idx)) => {
                    if graph.find_edge(from_idx, to_idx).is_none() {
                        graph.add_edge(from_idx, to_idx, kind);
                    }
                }
                _ => {
                    missing.insert(MissingTarget { from, target });
                }
            }
        }

        Self {
            graph,
            node_indices,
            missing: missing.into_iter().collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Definitions `name` refers to
    pub fn refs_out(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Definitions that refer to `name`
    pub fn refs_in(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| match direction {
                Direction::Outgoing => e.target(),
                Direction::Incoming => e.source(),
            })
            .map(|i| self.graph[i].as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn is_self_referential(&self, name: &str) -> bool {
        self.node_indices
            .get(name)
            .map(|&idx| self.graph.find_edge(idx, idx).is_some())
            .unwrap_or(false)
    }

    /// Groups of definitions that reach themselves through refs
    ///
    /// Each group is sorted; groups are ordered by their first member.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&i| self.graph.find_edge(i, i).is_some())
            })
            .map(|scc| {
                let mut members: Vec<String> =
                    scc.into_iter().map(|i| self.graph[i].clone()).collect();
                members.sort();
                members
            })
            .collect();
        groups.sort();
        groups
    }

    /// Refs to names with no definition, sorted
    pub fn missing_targets(&self) -> &[MissingTarget] {
        &self.missing
    }
}

fn collect_refs(from: &str, props: &[Property], nested: bool, out: &mut Vec<(String, String, RefEdge)>) {
    for prop in props {
        let schema = &prop.value;
        if !schema.reference.is_empty() {
            let kind = if nested { RefEdge::Nested } else { RefEdge::Property };
            out.push((from.to_string(), ref_target(&schema.reference).to_string(), kind));
        }
        if let Some(reference) = schema.items.reference() {
            out.push((from.to_string(), ref_target(reference).to_string(), RefEdge::Items));
        }
        collect_refs(from, &schema.properties.additional_properties, true, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn index() -> DefinitionIndex {
        DefinitionIndex::from_value(
            json!({
                "definitions": { "additional_properties": [
                    { "name": "e.v1.JSONSchemaProps", "value": { "properties": { "additional_properties": [
                        { "name": "not", "value": { "_ref": "#/definitions/e.v1.JSONSchemaProps" } },
                        { "name": "allOf", "value": { "items": { "schema": [ { "_ref": "#/definitions/e.v1.JSONSchemaProps" } ] } } }
                    ] } } },
                    { "name": "a.v1.A", "value": { "properties": { "additional_properties": [
                        { "name": "b", "value": { "_ref": "#/definitions/b.v1.B" } }
                    ] } } },
                    { "name": "b.v1.B", "value": { "properties": { "additional_properties": [
                        { "name": "inline", "value": { "properties": { "additional_properties": [
                            { "name": "a", "value": { "_ref": "#/definitions/a.v1.A" } }
                        ] } } },
                        { "name": "ghost", "value": { "_ref": "#/definitions/does.not.exist" } }
                    ] } } }
                ] }
            }),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_edges_deduplicated() {
        let graph = RefGraph::from_index(&index());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.refs_out("b.v1.B"), vec!["a.v1.A"]);
        assert_eq!(graph.refs_in("b.v1.B"), vec!["a.v1.A"]);
        assert!(graph.refs_out("unknown").is_empty());
    }

    #[test]
    fn test_cycles() {
        let graph = RefGraph::from_index(&index());
        assert!(graph.is_self_referential("e.v1.JSONSchemaProps"));
        assert!(!graph.is_self_referential("a.v1.A"));
        assert_eq!(
            graph.cycles(),
            vec![
                vec!["a.v1.A".to_string(), "b.v1.B".to_string()],
                vec!["e.v1.JSONSchemaProps".to_string()],
            ]
        );
    }

    #[test]
    fn test_missing_targets() {
        let graph = RefGraph::from_index(&index());
        assert_eq!(
            graph.missing_targets(),
            &[MissingTarget {
                from: "b.v1.B".to_string(),
                target: "does.not.exist".to_string(),
            }]
        );
    }
}
