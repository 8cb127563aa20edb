//! Tree node shared by type roots and property nodes

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::document::{ref_target, EnumValue, Items};

use super::gvk::Gvk;

/// Description given to the leaf emitted for a dangling `$ref`
pub const MISSING_DEFINITION: &str = "Referenced definition not found";

/// One node of a materialized schema tree
///
/// Roots are built from definitions (`id` is the fully-qualified name, `label`
/// its last dotted segment); every other node comes from a property (`id` and
/// `label` are both the property name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub label: String,
    /// Display handle, unique within a finished forest
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(default, rename = "ref", skip_serializing_if = "String::is_empty")]
    pub reference: String,
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Items::is_empty")]
    pub items: Items,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    /// Parsed from `id` on roots only; best effort
    #[serde(skip)]
    pub gvk: Gvk,
}

impl TreeNode {
    /// Leaf standing in for a `$ref` whose target is not defined
    pub fn missing(name: &str) -> Self {
        Self {
            id: name.to_string(),
            label: name.to_string(),
            description: MISSING_DEFINITION.to_string(),
            ..Default::default()
        }
    }

    /// Target definition name of this node's `$ref`, if any
    pub fn ref_name(&self) -> Option<&str> {
        if self.reference.is_empty() {
            None
        } else {
            Some(ref_target(&self.reference))
        }
    }

    /// Whether this node is the not-found leaf for a dangling `$ref`
    pub fn is_missing(&self) -> bool {
        self.children.is_empty() && self.description == MISSING_DEFINITION
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Pre-order visit of every node in this subtree
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Find a direct child by id
    pub fn child(&self, id: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Follow a path of child ids from this node
    pub fn descend(&self, path: &[&str]) -> Option<&TreeNode> {
        path.iter().try_fold(self, |node, id| node.child(id))
    }

    /// Indented text outline of this subtree
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, level: usize) {
        let indent = "  ".repeat(level);
        let _ = write!(out, "{}{}", indent, self.label);
        if self.id != self.label {
            let _ = write!(out, " ({})", self.id);
        }
        if !self.type_name.is_empty() {
            let _ = write!(out, " : {}", self.type_name);
        }
        if !self.reference.is_empty() {
            let _ = write!(out, " -> {}", ref_target(&self.reference));
        }
        out.push('\n');
        for child in &self.children {
            child.write_outline(out, level + 1);
        }
    }
}
