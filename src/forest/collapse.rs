//! Removes the wrapper level left behind by ref expansion
//!
//! `spec -> PodSpec -> [containers, volumes, ...]` becomes
//! `spec -> [containers, volumes, ...]`.

use super::node::TreeNode;
use super::Forest;

pub fn collapse_levels(mut forest: Forest) -> Forest {
    forest.roots = forest.roots.into_iter().map(collapse).collect();
    forest
}

/// Lift the target's fields when a ref node holds only its target wrapper
pub fn collapse(mut node: TreeNode) -> TreeNode {
    let collapsible = match (node.ref_name(), node.children.as_slice()) {
        (Some(name), [only]) => only.id == name && !only.children.is_empty(),
        _ => false,
    };

    if collapsible {
        if let Some(wrapper) = node.children.pop() {
            node.children = wrapper.children;
        }
    }

    node.children = node.children.into_iter().map(collapse).collect();
    node
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> TreeNode {
        TreeNode {
            id: id.to_string(),
            label: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_wrapper_removed() {
        let mut wrapper = node("x.v1.X");
        wrapper.children = vec![node("a"), node("b"), node("c")];
        let mut field = node("x");
        field.reference = "#/definitions/x.v1.X".to_string();
        field.children = vec![wrapper];

        let collapsed = collapse(field);
        let ids: Vec<_> = collapsed.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(collapsed.reference, "#/definitions/x.v1.X");
    }

    #[test]
    fn test_missing_placeholder_kept() {
        let mut field = node("broken");
        field.reference = "#/definitions/does.not.exist".to_string();
        field.children = vec![TreeNode::missing("does.not.exist")];

        let collapsed = collapse(field.clone());
        assert_eq!(collapsed, field);
    }

    #[test]
    fn test_nested_wrappers_collapse() {
        let mut inner_wrapper = node("y.v1.Y");
        inner_wrapper.children = vec![node("leaf")];
        let mut inner = node("y");
        inner.reference = "#/definitions/y.v1.Y".to_string();
        inner.children = vec![inner_wrapper];

        let mut outer_wrapper = node("x.v1.X");
        outer_wrapper.children = vec![inner];
        let mut outer = node("x");
        outer.reference = "#/definitions/x.v1.X".to_string();
        outer.children = vec![outer_wrapper];

        let collapsed = collapse(outer);
        assert_eq!(collapsed.descend(&["y", "leaf"]).unwrap().id, "leaf");
    }

    #[test]
    fn test_extra_children_block_collapse() {
        let mut wrapper = node("x.v1.X");
        wrapper.children = vec![node("a")];
        let mut field = node("x");
        field.reference = "#/definitions/x.v1.X".to_string();
        field.children = vec![wrapper, node("extra")];

        let collapsed = collapse(field);
        assert_eq!(collapsed.children.len(), 2);
        assert_eq!(collapsed.children[0].id, "x.v1.X");
    }
}
