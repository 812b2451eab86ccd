//! Preference manager: sole authority over the page tree and the current page

use std::fmt;

use tracing::{debug, instrument};

use crate::domain::arena::{NodeId, PreferenceNode, PreferenceTree};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::page::{BlankPage, PageRef};
use crate::domain::store::SharedStore;

/// Handle returned on listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type CurrentPageListener = Box<dyn FnMut(&PageRef)>;

/// Owns the page tree, the shared store, the current-page selection and its listeners.
///
/// Listeners are called synchronously, in registration order, each time the current
/// page is set. A listener holds no reference to the manager, so it cannot change the
/// selection while being notified.
pub struct PreferenceManager {
    tree: PreferenceTree,
    store: Option<SharedStore>,
    current: PageRef,
    /// Node whose page was last selected by path
    current_node: Option<NodeId>,
    listeners: Vec<(ListenerId, CurrentPageListener)>,
    next_listener: u64,
}

impl Default for PreferenceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PreferenceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceManager")
            .field("tree", &self.tree)
            .field("has_store", &self.store.is_some())
            .field("current", &self.current.title())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl PreferenceManager {
    pub fn new() -> Self {
        Self::with_root_page(BlankPage::default().shared())
    }

    /// The initial current page is the root's page.
    pub fn with_root_page(root_page: PageRef) -> Self {
        let tree = PreferenceTree::new(root_page.clone());
        let root = tree.root();
        Self {
            tree,
            store: None,
            current: root_page,
            current_node: Some(root),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn tree(&self) -> &PreferenceTree {
        &self.tree
    }

    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn node(&self, id: NodeId) -> Option<&PreferenceNode> {
        self.tree.node(id)
    }

    pub fn store(&self) -> Option<&SharedStore> {
        self.store.as_ref()
    }

    pub fn set_store(&mut self, store: Option<SharedStore>) {
        self.store = store;
    }

    /// Register a detached node; attach it with [`add`](Self::add) or [`add_to`](Self::add_to).
    pub fn create(&mut self, node: PreferenceNode) -> NodeId {
        self.tree.create(node)
    }

    /// Append `child` to the root.
    pub fn add(&mut self, child: NodeId) -> DomainResult<()> {
        self.add_to(self.tree.root(), child)
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    #[instrument(level = "debug", skip(self))]
    pub fn add_to(&mut self, parent: NodeId, child: NodeId) -> DomainResult<()> {
        self.tree.append_child(parent, child)
    }

    pub fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> DomainResult<()> {
        self.tree.insert_child(parent, child, index)
    }

    /// Create `node` and append it to the root in one step.
    pub fn add_node(&mut self, node: PreferenceNode) -> DomainResult<NodeId> {
        self.add_node_to(self.tree.root(), node)
    }

    /// Create `node` and append it to `parent`; on failure the node is released again.
    pub fn add_node_to(&mut self, parent: NodeId, node: PreferenceNode) -> DomainResult<NodeId> {
        let id = self.tree.create(node);
        match self.tree.append_child(parent, id) {
            Ok(()) => Ok(id),
            Err(e) => {
                self.tree.discard(id)?;
                Err(e)
            }
        }
    }

    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> DomainResult<NodeId> {
        self.tree.remove_child(parent, index)
    }

    /// Returns false when the node had no parent.
    pub fn remove_from_parent(&mut self, node: NodeId) -> DomainResult<bool> {
        self.tree.remove_from_parent(node)
    }

    /// Release a detached subtree.
    pub fn discard(&mut self, node: NodeId) -> DomainResult<usize> {
        self.tree.discard(node)
    }

    pub fn rename(&mut self, node: NodeId, identifier: &str) -> DomainResult<()> {
        self.tree.rename(node, identifier)
    }

    pub fn set_page(&mut self, node: NodeId, page: PageRef) -> DomainResult<()> {
        self.tree.set_page(node, page)
    }

    pub fn set_label(&mut self, node: NodeId, label: Option<String>) -> DomainResult<()> {
        self.tree.set_label(node, label)
    }

    pub fn set_icon(&mut self, node: NodeId, icon: Option<String>) -> DomainResult<()> {
        self.tree.set_icon(node, icon)
    }

    pub fn current_page(&self) -> &PageRef {
        &self.current
    }

    /// Path of the node whose page is current, if the selection came from the tree.
    pub fn current_path(&self) -> Option<String> {
        self.current_node.and_then(|id| self.tree.path_of(id))
    }

    /// Make `page` current and notify listeners.
    ///
    /// The page is not required to belong to the tree.
    pub fn set_current_page(&mut self, page: PageRef) {
        self.current_node = None;
        self.select(page);
    }

    /// Make the page at `path` current and notify listeners.
    ///
    /// The path starts with the root identifier, e.g. `root/general/display`.
    /// An unresolvable path returns `PathNotFound`; the selection is left unchanged
    /// and no listener is called.
    #[instrument(level = "debug", skip(self))]
    pub fn set_current_page_by_path(&mut self, path: &str) -> DomainResult<()> {
        let node = self
            .tree
            .find(path)
            .ok_or_else(|| DomainError::PathNotFound(path.to_string()))?;
        let page = self
            .tree
            .node(node)
            .ok_or(DomainError::NodeNotFound)?
            .page()
            .clone();
        self.current_node = Some(node);
        self.select(page);
        Ok(())
    }

    fn select(&mut self, page: PageRef) {
        debug!("current page: {:?}", page.title());
        for (_, listener) in self.listeners.iter_mut() {
            listener(&page);
        }
        self.current = page;
    }

    pub fn add_current_page_listener(
        &mut self,
        listener: impl FnMut(&PageRef) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false when `id` was not registered.
    pub fn remove_current_page_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }
}
