//! Ref substitution passes
//!
//! After the first pass a `$ref` is either a childless leaf (its target was
//! already expanded elsewhere) or carries the target's tree as its first
//! child. Both are replaced here by a deep copy of the target's root, and the
//! copy is resolved in turn.
//!
//! Copies come from the ref cache in the build context. The first lookup of a
//! ref searches the forest's roots and stores a copy; every later use clones
//! the stored one, so each usage site owns its nodes. Both passes track the
//! targets being substituted on the current ancestor path and leave a ref to
//! any of them as it is, which keeps self-referential types finite.

use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::document::ref_target;

use super::node::TreeNode;
use super::{BuildContext, Forest};

/// Replace ref placeholders with copies of their target roots
pub fn resolve_refs(mut forest: Forest, ctx: &mut BuildContext) -> Forest {
    let roots: Vec<TreeNode> = {
        let mut resolver = RefResolver::new(&forest.roots, &mut ctx.ref_cache);
        forest
            .roots
            .iter()
            .map(|root| resolver.load_child(root))
            .collect()
    };
    forest.roots = roots;
    debug!(cached = ctx.ref_cache.len(), "ref placeholders resolved");
    forest
}

/// Give array nodes the fields of their `$ref` element type
pub fn resolve_array_items(mut forest: Forest, ctx: &mut BuildContext) -> Forest {
    let roots: Vec<TreeNode> = {
        let mut resolver = RefResolver::new(&forest.roots, &mut ctx.ref_cache);
        forest
            .roots
            .iter()
            .map(|root| resolver.load_array_items(root))
            .collect()
    };
    forest.roots = roots;
    debug!(cached = ctx.ref_cache.len(), "array item refs resolved");
    forest
}

/// Looks up ref targets among a forest's roots, through a shared cache
pub struct RefResolver<'a> {
    source: &'a [TreeNode],
    cache: &'a mut HashMap<String, TreeNode>,
}

impl<'a> RefResolver<'a> {
    pub fn new(source: &'a [TreeNode], cache: &'a mut HashMap<String, TreeNode>) -> Self {
        Self { source, cache }
    }

    /// Deep copy of the root a `$ref` points at, or `None` when no root matches
    pub fn fetch_by_ref(&mut self, reference: &str) -> Option<TreeNode> {
        if let Some(hit) = self.cache.get(reference) {
            trace!(reference, "ref cache hit");
            return Some(hit.clone());
        }

        let name = ref_target(reference);
        let root = self.source.iter().find(|root| root.id == name)?;
        let copy = root.clone();
        self.cache.insert(reference.to_string(), copy.clone());
        Some(copy)
    }

    /// Copy of `node` with every reachable ref placeholder substituted
    pub fn load_child(&mut self, node: &TreeNode) -> TreeNode {
        self.load_child_within(node, &mut HashSet::new())
    }

    fn load_child_within(&mut self, node: &TreeNode, path: &mut HashSet<String>) -> TreeNode {
        let mut out = shell(node);

        if let Some(name) = node.ref_name() {
            let skip = match node.children.first() {
                None => Some(0),
                Some(first) if first.id == name => Some(1),
                Some(_) => None,
            };

            if path.contains(name) {
                trace!(reference = %node.reference, "ref target on ancestor path, not substituted");
            } else if let Some(skip) = skip {
                if let Some(target) = self.fetch_by_ref(&node.reference) {
                    path.insert(name.to_string());
                    let mut copy = shell(&target);
                    copy.children = target
                        .children
                        .iter()
                        .map(|c| self.load_child_within(c, path))
                        .collect();
                    path.remove(name);

                    out.children.push(copy);
                    for child in &node.children[skip..] {
                        out.children.push(self.load_child_within(child, path));
                    }
                    return out;
                }
            }
        }

        out.children = node
            .children
            .iter()
            .map(|c| self.load_child_within(c, path))
            .collect();
        out
    }

    /// Copy of `node` where array nodes carry their element type's fields
    pub fn load_array_items(&mut self, node: &TreeNode) -> TreeNode {
        self.load_array_items_within(node, &mut HashSet::new())
    }

    fn load_array_items_within(&mut self, node: &TreeNode, path: &mut HashSet<String>) -> TreeNode {
        let mut out = shell(node);

        if let Some(reference) = node.items.reference() {
            let name = ref_target(reference);
            if path.contains(name) {
                trace!(reference, node = %node.id, "element type on ancestor path, not filled");
            } else if let Some(element) = self.fetch_by_ref(reference) {
                trace!(reference, node = %node.id, "array items filled");
                path.insert(name.to_string());
                out.children = element
                    .children
                    .iter()
                    .map(|c| self.load_array_items_within(c, path))
                    .collect();
                path.remove(name);
                return out;
            }
        }

        out.children = node
            .children
            .iter()
            .map(|c| self.load_array_items_within(c, path))
            .collect();
        out
    }
}

// Copy of a node without its children.
fn shell(node: &TreeNode) -> TreeNode {
    TreeNode {
        id: node.id.clone(),
        label: node.label.clone(),
        value: node.value.clone(),
        description: node.description.clone(),
        type_name: node.type_name.clone(),
        reference: node.reference.clone(),
        enum_values: node.enum_values.clone(),
        items: node.items.clone(),
        children: Vec::new(),
        gvk: node.gvk.clone(),
    }
}
