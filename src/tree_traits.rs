/*
Rendering of preference trees as terminal trees (termtree).
A trait keeps the rendering out of the domain type itself.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::{NodeId, PreferenceNode, PreferenceTree};

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

/// `identifier`, or `identifier (label)` when the label says something more.
fn node_text(node: &PreferenceNode) -> String {
    let identifier = node.identifier().as_str();
    let label = node.label();
    if label.is_empty() || label == identifier {
        identifier.to_string()
    } else {
        format!("{identifier} ({label})")
    }
}

impl TreeNodeConvert for PreferenceTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &PreferenceTree, id: NodeId) -> Tree<String> {
            let text = tree.node(id).map(node_text).unwrap_or_default();
            let leaves: Vec<_> = tree
                .children(id)
                .iter()
                .map(|&child| build_tree(tree, child))
                .collect();
            Tree::new(text).with_leaves(leaves)
        }

        build_tree(self, self.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BlankPage, PreferenceManager};

    #[test]
    fn given_nested_pages_when_rendering_then_shows_hierarchy_with_labels() {
        let mut manager = PreferenceManager::new();
        let general = manager
            .add_node(PreferenceNode::new("general", BlankPage::new("General").shared()).unwrap())
            .unwrap();
        manager
            .add_node_to(general, PreferenceNode::blank("display").unwrap())
            .unwrap();

        let rendered = manager.tree().to_tree_string().to_string();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "root");
        assert!(lines[1].ends_with("general (General)"));
        assert!(lines[2].ends_with("display"));
    }
}
