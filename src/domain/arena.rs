use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::identifier::Identifier;
use crate::domain::page::{BlankPage, PageRef};

/// Handle to a node in a [`PreferenceTree`].
///
/// Generational: a handle to a discarded node never resolves to a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{slot}.{generation}")
    }
}

/// Data payload for tree nodes: one addressable preference page.
#[derive(Debug, Clone)]
pub struct PreferenceNode {
    identifier: Identifier,
    label: String,
    /// Opaque icon reference, cosmetic only
    icon: Option<String>,
    page: PageRef,
}

impl PreferenceNode {
    /// Create a node for `page`. The label defaults to the page title.
    pub fn new(identifier: &str, page: PageRef) -> DomainResult<Self> {
        let identifier = Identifier::new(identifier)?;
        Ok(Self {
            label: page.title().to_string(),
            identifier,
            icon: None,
            page,
        })
    }

    /// Create a node without content; a blank page titled after the identifier stands in.
    pub fn blank(identifier: &str) -> DomainResult<Self> {
        Self::new(identifier, BlankPage::new(identifier).shared())
    }

    pub(crate) fn root(page: PageRef) -> Self {
        Self {
            identifier: Identifier::root(),
            label: String::new(),
            icon: None,
            page,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Validates the allowed-character pattern only.
    ///
    /// Sibling uniqueness is checked by the tree when the node is attached or renamed there.
    pub fn set_identifier(&mut self, identifier: &str) -> DomainResult<()> {
        self.identifier = Identifier::new(identifier)?;
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// `None` falls back to the current page title.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label.unwrap_or_else(|| self.page.title().to_string());
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn set_icon(&mut self, icon: Option<String>) {
        self.icon = icon;
    }

    pub fn page(&self) -> &PageRef {
        &self.page
    }

    pub fn set_page(&mut self, page: PageRef) {
        self.page = page;
    }
}

impl fmt::Display for PreferenceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    data: PreferenceNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl TreeNode {
    pub fn data(&self) -> &PreferenceNode {
        &self.data
    }

    /// None for the root and for detached nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena-based page tree with a single implicit root.
///
/// Detached nodes stay in the arena until re-attached or discarded. Mutation is
/// crate-internal: callers go through [`PreferenceManager`](crate::domain::PreferenceManager).
#[derive(Debug)]
pub struct PreferenceTree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for PreferenceTree {
    fn default() -> Self {
        Self::new(BlankPage::default().shared())
    }
}

impl PreferenceTree {
    pub fn new(root_page: PageRef) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode {
            data: PreferenceNode::root(root_page),
            parent: None,
            children: Vec::new(),
        }));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes held, attached or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    pub fn node(&self, id: NodeId) -> Option<&PreferenceNode> {
        self.get(id).map(|n| &n.data)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_ancestor_or_self(self.root, id)
    }

    fn entry(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.arena.get(id.0).ok_or(DomainError::NodeNotFound)
    }

    fn entry_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.arena.get_mut(id.0).ok_or(DomainError::NodeNotFound)
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn child_by_identifier(&self, parent: NodeId, identifier: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&c| self.node(c).is_some_and(|n| n.identifier == *identifier))
    }

    /// Register a detached node.
    #[instrument(level = "trace", skip(self, node), fields(identifier = %node.identifier))]
    pub(crate) fn create(&mut self, node: PreferenceNode) -> NodeId {
        NodeId(self.arena.insert(TreeNode {
            data: node,
            parent: None,
            children: Vec::new(),
        }))
    }

    /// Insert `child` under `parent` at `index`, detaching it from any previous parent.
    ///
    /// Every check runs before anything is unlinked, so a failure leaves the tree as it was.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> DomainResult<()> {
        let child_entry = self.entry(child)?;
        let identifier = child_entry.data.identifier.clone();
        let old_parent = child_entry.parent;
        let siblings = &self.entry(parent)?.children;

        if child == self.root {
            return Err(DomainError::RootNotMovable);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DomainError::CycleDetected {
                parent: self.describe(parent),
                child: identifier.to_string(),
            });
        }
        let conflict = siblings
            .iter()
            .any(|&s| s != child && self.node(s).is_some_and(|n| n.identifier == identifier));
        if conflict {
            return Err(DomainError::ConflictingIdentifier(identifier.to_string()));
        }
        let len = if old_parent == Some(parent) {
            siblings.len() - 1
        } else {
            siblings.len()
        };
        if index > len {
            return Err(DomainError::IndexOutOfBounds { index, len });
        }

        if let Some(old) = old_parent {
            self.unlink(old, child);
        }
        self.entry_mut(parent)?.children.insert(index, child);
        self.entry_mut(child)?.parent = Some(parent);
        debug!("inserted {} under {} at {}", identifier, self.describe(parent), index);
        Ok(())
    }

    /// Append `child` as the last child of `parent`; a current child moves to the end.
    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        let count = self.entry(parent)?.children.len();
        let index = if self.parent(child) == Some(parent) {
            count - 1
        } else {
            count
        };
        self.insert_child(parent, child, index)
    }

    /// Unlink the child at `index`; its subtree travels with it.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn remove_child(&mut self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        let children = &self.entry(parent)?.children;
        let child = *children.get(index).ok_or(DomainError::IndexOutOfBounds {
            index,
            len: children.len(),
        })?;
        self.unlink(parent, child);
        Ok(child)
    }

    /// Returns false when the node had no parent.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn remove_from_parent(&mut self, node: NodeId) -> DomainResult<bool> {
        match self.entry(node)?.parent {
            Some(parent) => {
                self.unlink(parent, node);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.arena.get_mut(parent.0) {
            p.children.retain(|&c| c != child);
        }
        if let Some(c) = self.arena.get_mut(child.0) {
            c.parent = None;
        }
    }

    /// Release a detached node and all its descendants. Returns the number of nodes released.
    #[instrument(level = "debug", skip(self))]
    pub(crate) fn discard(&mut self, node: NodeId) -> DomainResult<usize> {
        if node == self.root {
            return Err(DomainError::RootNotMovable);
        }
        if self.entry(node)?.parent.is_some() {
            return Err(DomainError::NodeAttached(self.describe(node)));
        }
        let subtree: Vec<NodeId> = self.iter_from(node).map(|(id, _)| id).collect();
        for id in &subtree {
            self.arena.remove(id.0);
        }
        Ok(subtree.len())
    }

    /// Change a node's identifier, keeping it unique among its current siblings.
    pub(crate) fn rename(&mut self, node: NodeId, identifier: &str) -> DomainResult<()> {
        if node == self.root {
            return Err(DomainError::RootNotMovable);
        }
        let identifier = Identifier::new(identifier)?;
        if let Some(parent) = self.entry(node)?.parent {
            let taken = self
                .child_by_identifier(parent, identifier.as_str())
                .is_some_and(|other| other != node);
            if taken {
                return Err(DomainError::ConflictingIdentifier(identifier.to_string()));
            }
        }
        self.entry_mut(node)?.data.identifier = identifier;
        Ok(())
    }

    pub(crate) fn set_page(&mut self, node: NodeId, page: PageRef) -> DomainResult<()> {
        self.entry_mut(node)?.data.set_page(page);
        Ok(())
    }

    pub(crate) fn set_label(&mut self, node: NodeId, label: Option<String>) -> DomainResult<()> {
        self.entry_mut(node)?.data.set_label(label);
        Ok(())
    }

    pub(crate) fn set_icon(&mut self, node: NodeId, icon: Option<String>) -> DomainResult<()> {
        self.entry_mut(node)?.data.set_icon(icon);
        Ok(())
    }

    /// Resolve a `/`-delimited identifier path starting at the root, e.g. `root/general/display`.
    ///
    /// Every segment must match; there is no skipping of unknown segments.
    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('/');
        let first = segments.next()?;
        if self.node(self.root)?.identifier != *first {
            return None;
        }
        segments.try_fold(self.root, |current, segment| {
            self.child_by_identifier(current, segment)
        })
    }

    /// Identifier path of a node, from its topmost ancestor down.
    pub fn path_of(&self, node: NodeId) -> Option<String> {
        self.get(node)?;
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = self.get(id)?;
            segments.push(entry.data.identifier.as_str());
            current = entry.parent;
        }
        Some(segments.iter().rev().join("/"))
    }

    fn describe(&self, node: NodeId) -> String {
        self.path_of(node).unwrap_or_else(|| node.to_string())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node: NodeId) -> usize {
        match self.get(node) {
            Some(n) => {
                1 + n
                    .children
                    .iter()
                    .map(|&child| self.calculate_depth(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }

    /// Attached nodes without children, left to right.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.is_leaf())
            .map(|(id, _)| id)
            .collect()
    }

    /// Pre-order traversal of everything reachable from the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        self.iter_from(self.root)
    }

    pub fn iter_from(&self, start: NodeId) -> TreeIterator<'_> {
        TreeIterator::new(self, start)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, self.root)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a PreferenceTree,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a PreferenceTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a PreferenceTree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a PreferenceTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![(start, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.get(current) {
                if visited {
                    return Some((current, node));
                }
                self.stack.push((current, true));
                for &child in node.children.iter().rev() {
                    self.stack.push((child, false));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    /// root ── a ── b
    ///      └─ c
    struct Fixture {
        tree: PreferenceTree,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    }

    #[fixture]
    fn small() -> Fixture {
        let mut tree = PreferenceTree::default();
        let root = tree.root();
        let a = tree.create(PreferenceNode::blank("a").unwrap());
        let b = tree.create(PreferenceNode::blank("b").unwrap());
        let c = tree.create(PreferenceNode::blank("c").unwrap());
        tree.append_child(root, a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(root, c).unwrap();
        Fixture { tree, a, b, c }
    }

    fn identifiers(tree: &PreferenceTree, ids: impl IntoIterator<Item = NodeId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| tree.node(id).unwrap().identifier().to_string())
            .collect()
    }

    #[rstest]
    fn given_tree_when_iterating_then_visits_preorder(small: Fixture) {
        let order = identifiers(&small.tree, small.tree.iter().map(|(id, _)| id));
        assert_eq!(order, ["root", "a", "b", "c"]);
    }

    #[rstest]
    fn given_tree_when_iterating_postorder_then_children_come_first(small: Fixture) {
        let order = identifiers(&small.tree, small.tree.iter_postorder().map(|(id, _)| id));
        assert_eq!(order, ["b", "a", "c", "root"]);
    }

    #[rstest]
    fn given_tree_when_measuring_then_reports_depth_and_leaves(small: Fixture) {
        assert_eq!(small.tree.depth(), 3);
        assert_eq!(identifiers(&small.tree, small.tree.leaves()), ["b", "c"]);
    }

    #[rstest]
    fn given_node_when_inserting_under_own_descendant_then_cycle_is_rejected(mut small: Fixture) {
        let err = small.tree.insert_child(small.b, small.a, 0).unwrap_err();
        assert!(matches!(err, DomainError::CycleDetected { .. }));
        assert_eq!(small.tree.parent(small.a), Some(small.tree.root()));
        assert_eq!(small.tree.parent(small.b), Some(small.a));
    }

    #[rstest]
    fn given_node_when_inserting_under_itself_then_cycle_is_rejected(mut small: Fixture) {
        let err = small.tree.append_child(small.c, small.c).unwrap_err();
        assert!(matches!(err, DomainError::CycleDetected { .. }));
    }

    #[rstest]
    fn given_root_when_inserting_anywhere_then_rejected(mut small: Fixture) {
        let loose = small.tree.create(PreferenceNode::blank("loose").unwrap());
        let root = small.tree.root();
        assert!(matches!(
            small.tree.append_child(loose, root),
            Err(DomainError::RootNotMovable)
        ));
    }

    #[rstest]
    fn given_attached_node_when_inserting_elsewhere_then_reparents(mut small: Fixture) {
        small.tree.append_child(small.c, small.b).unwrap();

        assert!(small.tree.children(small.a).is_empty());
        assert_eq!(small.tree.children(small.c), &[small.b]);
        assert_eq!(small.tree.parent(small.b), Some(small.c));
    }

    #[rstest]
    fn given_existing_child_when_appending_again_then_moves_to_end(mut small: Fixture) {
        let root = small.tree.root();
        small.tree.append_child(root, small.a).unwrap();
        assert_eq!(small.tree.children(root), &[small.c, small.a]);
    }

    #[rstest]
    fn given_index_past_end_when_inserting_then_out_of_bounds(mut small: Fixture) {
        let d = small.tree.create(PreferenceNode::blank("d").unwrap());
        let root = small.tree.root();
        let err = small.tree.insert_child(root, d, 5).unwrap_err();
        assert!(matches!(err, DomainError::IndexOutOfBounds { index: 5, len: 2 }));
        assert_eq!(small.tree.parent(d), None);
    }

    #[rstest]
    fn given_attached_subtree_when_removing_then_descendants_travel_along(mut small: Fixture) {
        let root = small.tree.root();
        let removed = small.tree.remove_child(root, 0).unwrap();

        assert_eq!(removed, small.a);
        assert!(!small.tree.is_attached(small.a));
        assert_eq!(small.tree.parent(small.b), Some(small.a));
        assert_eq!(small.tree.path_of(small.b).unwrap(), "a/b");
    }

    #[rstest]
    fn given_detached_subtree_when_discarding_then_releases_all(mut small: Fixture) {
        assert!(matches!(
            small.tree.discard(small.a),
            Err(DomainError::NodeAttached(_))
        ));

        small.tree.remove_from_parent(small.a).unwrap();
        let released = small.tree.discard(small.a).unwrap();

        assert_eq!(released, 2);
        assert!(!small.tree.contains(small.b));
        assert_eq!(small.tree.len(), 2);
    }

    #[rstest]
    #[case("root", Some("root"))]
    #[case("root/a/b", Some("b"))]
    #[case("root/c", Some("c"))]
    #[case("a/b", None)]
    #[case("root/b", None)]
    #[case("root/a/b/x", None)]
    #[case("", None)]
    #[case("root/", None)]
    fn given_path_when_finding_then_walks_strictly(
        small: Fixture,
        #[case] path: &str,
        #[case] expected: Option<&str>,
    ) {
        let found = small
            .tree
            .find(path)
            .map(|id| small.tree.node(id).unwrap().identifier().to_string());
        assert_eq!(found.as_deref(), expected);
    }

    #[rstest]
    fn given_attached_node_when_renaming_to_sibling_identifier_then_conflicts(mut small: Fixture) {
        let err = small.tree.rename(small.c, "a").unwrap_err();
        assert!(matches!(err, DomainError::ConflictingIdentifier(ref id) if id == "a"));
        assert_eq!(small.tree.node(small.c).unwrap().identifier().as_str(), "c");

        small.tree.rename(small.c, "cc").unwrap();
        assert_eq!(small.tree.find("root/cc"), Some(small.c));
    }

    #[test]
    fn given_page_without_label_when_creating_node_then_label_is_page_title() {
        let page = BlankPage::new("Display Settings").shared();
        let mut node = PreferenceNode::new("display", page).unwrap();
        assert_eq!(node.to_string(), "Display Settings");

        node.set_label(Some("Display".into()));
        assert_eq!(node.label(), "Display");
        node.set_label(None);
        assert_eq!(node.label(), "Display Settings");
    }
}
