//! First pass: definitions to trees
//!
//! Every `$ref` is expanded at its first occurrence in the whole build and
//! left as a childless leaf everywhere after. The visited set is shared by all
//! roots, which is what bounds recursion on self-referential types.

use tracing::trace;

use crate::document::{ref_target, Definition, DefinitionIndex, Property};

use super::gvk::Gvk;
use super::node::TreeNode;
use super::{BuildContext, Forest};

/// Build one tree per definition, in document order
pub fn build_forest(index: &DefinitionIndex, ctx: &mut BuildContext) -> Forest {
    let mut builder = TreeBuilder::new(index, ctx);
    let roots = index.iter().map(|def| builder.build_root(def)).collect();
    Forest::from_roots(roots)
}

/// Converts definitions and their properties into tree nodes
pub struct TreeBuilder<'a> {
    index: &'a DefinitionIndex,
    ctx: &'a mut BuildContext,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(index: &'a DefinitionIndex, ctx: &'a mut BuildContext) -> Self {
        Self { index, ctx }
    }

    /// Root node for a definition, with one child per property
    pub fn build_root(&mut self, def: &Definition) -> TreeNode {
        let label = def.name.rsplit('.').next().unwrap_or(&def.name).to_string();
        let children = def
            .properties()
            .iter()
            .map(|prop| self.build_property_node(prop))
            .collect();

        TreeNode {
            id: def.name.clone(),
            label,
            description: def.description().to_string(),
            type_name: def.type_name().to_string(),
            children,
            gvk: Gvk::from_definition_name(&def.name),
            ..Default::default()
        }
    }

    /// Node for a property; a first-seen `$ref` becomes its first child
    pub fn build_property_node(&mut self, prop: &Property) -> TreeNode {
        let schema = &prop.value;
        let reference = schema.reference.as_str();
        let mut children = Vec::new();

        if !reference.is_empty() {
            if self.ctx.visited_refs.contains(reference) {
                trace!(reference, "ref already expanded, leaving leaf");
            } else {
                self.ctx.visited_refs.insert(reference.to_string());
                let name = ref_target(reference);
                let index = self.index;
                match index.get(name) {
                    Some(def) => {
                        trace!(reference, "expanding ref");
                        children.push(self.build_root(def));
                    }
                    None => {
                        trace!(reference, "ref target not defined");
                        children.push(TreeNode::missing(name));
                    }
                }
            }
        }

        for nested in &schema.properties.additional_properties {
            children.push(self.build_property_node(nested));
        }

        TreeNode {
            id: prop.name.clone(),
            label: prop.name.clone(),
            description: schema.description.clone(),
            type_name: schema.type_name().to_string(),
            reference: reference.to_string(),
            enum_values: schema.enum_values.clone(),
            items: schema.items.clone(),
            children,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DefinitionBody, PropertyList, PropertySchema, TypeSet};

    fn prop(name: &str, reference: &str) -> Property {
        Property {
            name: name.to_string(),
            value: PropertySchema {
                reference: reference.to_string(),
                ..Default::default()
            },
        }
    }

    fn def(name: &str, props: Vec<Property>) -> Definition {
        Definition {
            name: name.to_string(),
            value: DefinitionBody {
                description: format!("{} description", name),
                properties: PropertyList {
                    additional_properties: props,
                },
                type_set: TypeSet {
                    value: vec!["object".to_string(), "null".to_string()],
                },
            },
        }
    }

    #[test]
    fn test_root_fields() {
        let index = DefinitionIndex::from_definitions(vec![def(
            "io.k8s.api.apps.v1.Deployment",
            vec![prop("replicas", "")],
        )]);
        let mut ctx = BuildContext::new();
        let forest = build_forest(&index, &mut ctx);

        let root = &forest.roots()[0];
        assert_eq!(root.id, "io.k8s.api.apps.v1.Deployment");
        assert_eq!(root.label, "Deployment");
        assert_eq!(root.type_name, "object");
        assert_eq!(root.gvk, Gvk::new("apps", "v1", "Deployment"));
        assert_eq!(root.children[0].id, "replicas");
        assert_eq!(root.children[0].gvk, Gvk::default());
    }

    #[test]
    fn test_ref_expanded_once_across_forest() {
        let index = DefinitionIndex::from_definitions(vec![
            def("a.v1.A", vec![prop("meta", "#/definitions/m.v1.Meta")]),
            def("b.v1.B", vec![prop("meta", "#/definitions/m.v1.Meta")]),
            def("m.v1.Meta", vec![prop("name", "")]),
        ]);
        let mut ctx = BuildContext::new();
        let forest = build_forest(&index, &mut ctx);

        let a_meta = &forest.roots()[0].children[0];
        assert_eq!(a_meta.children.len(), 1);
        assert_eq!(a_meta.children[0].id, "m.v1.Meta");

        let b_meta = &forest.roots()[1].children[0];
        assert_eq!(b_meta.reference, "#/definitions/m.v1.Meta");
        assert!(b_meta.children.is_empty());
        assert!(ctx.is_visited("#/definitions/m.v1.Meta"));
    }

    #[test]
    fn test_self_reference_terminates() {
        let index = DefinitionIndex::from_definitions(vec![def(
            "x.v1.Node",
            vec![prop("next", "#/definitions/x.v1.Node")],
        )]);
        let mut ctx = BuildContext::new();
        let forest = build_forest(&index, &mut ctx);

        // Node -> next -> Node -> next (leaf)
        let root = &forest.roots()[0];
        let inner = root.descend(&["next", "x.v1.Node", "next"]).unwrap();
        assert!(inner.children.is_empty());
        assert_eq!(root.node_count(), 4);
    }

    #[test]
    fn test_missing_ref_placeholder() {
        let index = DefinitionIndex::from_definitions(vec![def(
            "x.v1.Holder",
            vec![prop("broken", "#/definitions/does.not.exist")],
        )]);
        let mut ctx = BuildContext::new();
        let forest = build_forest(&index, &mut ctx);

        let broken = &forest.roots()[0].children[0];
        assert_eq!(broken.children.len(), 1);
        assert_eq!(broken.children[0].id, "does.not.exist");
        assert!(broken.children[0].is_missing());
    }

    #[test]
    fn test_inline_properties_follow_ref_child() {
        let mut holder = prop("inline", "#/definitions/m.v1.Meta");
        holder.value.properties.additional_properties = vec![prop("extra", "")];
        let index = DefinitionIndex::from_definitions(vec![
            def("x.v1.Holder", vec![holder]),
            def("m.v1.Meta", vec![]),
        ]);
        let mut ctx = BuildContext::new();
        let forest = build_forest(&index, &mut ctx);

        let ids: Vec<_> = forest.roots()[0].children[0]
            .children
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["m.v1.Meta", "extra"]);
    }
}
