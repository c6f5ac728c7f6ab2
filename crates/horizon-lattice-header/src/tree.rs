//! The header tree arena.
//!
//! [`HeaderTree`] stores every header node in a slot map keyed by
//! [`HeaderId`]. A node owns its children list; the `parent` link is a plain
//! id and never keeps anything alive. Each parent connects to the change
//! signal of every direct child and re-emits it, so changes travel upward to
//! every listener above them.
//!
//! Derived values ([`columns_count`](HeaderTree::columns_count),
//! [`visible_columns_count`](HeaderTree::visible_columns_count),
//! [`is_visible`](HeaderTree::is_visible), [`address`](HeaderTree::address))
//! are recomputed on every call and never cached.
//!
//! # Related
//!
//! - [`SharedHeaderTree`] - Lock-guarded wrapper for sharing across threads
//! - [`crate::HeaderTreeDebug`] - Text dump of a subtree

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::SlotMap;

use crate::error::{HeaderError, HeaderResult};
use crate::header::{HeaderBuilder, HeaderId, HeaderNode, UNASSIGNED_INDEX};
use crate::logging::targets;
use crate::signal::{ConnectionGuard, ConnectionId, Signal};

/// Arena holding one or more header trees.
pub struct HeaderTree<C> {
    nodes: SlotMap<HeaderId, HeaderNode<C>>,
}

impl<C> Default for HeaderTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> HeaderTree<C> {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
        }
    }

    /// Number of live headers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no headers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if a header exists (has not been disposed).
    pub fn contains(&self, id: HeaderId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a header node.
    pub fn node(&self, id: HeaderId) -> HeaderResult<&HeaderNode<C>> {
        self.nodes.get(id).ok_or(HeaderError::InvalidHeaderId(id))
    }

    fn node_mut(&mut self, id: HeaderId) -> HeaderResult<&mut HeaderNode<C>> {
        self.nodes.get_mut(id).ok_or(HeaderError::InvalidHeaderId(id))
    }

    // =========================================================================
    // Construction & Children
    // =========================================================================

    /// Create a header (and its nested children) from a builder.
    ///
    /// Children are inserted first, in order, then linked to the new header:
    /// each gets its `parent` and `index` set and the new header subscribes to
    /// its change signal. No notification is emitted.
    pub fn insert(&mut self, builder: HeaderBuilder<C>) -> HeaderId {
        let (node, child_builders) = builder.into_parts();
        let child_ids = child_builders.map(|builders| {
            builders
                .into_iter()
                .map(|child| self.insert(child))
                .collect::<Vec<_>>()
        });

        let id = self.nodes.insert(node);
        if let Some(child_ids) = child_ids {
            self.install_children(id, child_ids);
        }
        tracing::trace!(target: targets::TREE, ?id, "inserted header");
        id
    }

    /// The header's children, or `None` for a leaf column.
    pub fn children(&self, id: HeaderId) -> HeaderResult<Option<&[HeaderId]>> {
        Ok(self.node(id)?.children())
    }

    /// Replace a header's children list.
    ///
    /// The previous children lose the subscription this header held on them
    /// but keep their `parent` and `index` values. The new children are linked
    /// in order and the header emits one change notification.
    ///
    /// The new list is checked before anything changes: every id must be live,
    /// must not be this header or one of its ancestors, must not currently sit
    /// in another header's children list, and must appear only once.
    #[tracing::instrument(skip(self, children), target = "horizon_lattice_header::tree", level = "trace")]
    pub fn replace_children(
        &mut self,
        id: HeaderId,
        children: Option<Vec<HeaderId>>,
    ) -> HeaderResult<()> {
        self.validate_children(id, children.as_deref())?;

        self.release_children(id);
        match children {
            Some(children) => self.install_children(id, children),
            None => self.node_mut(id)?.children = None,
        }

        tracing::trace!(target: targets::TREE, ?id, "replaced children");
        self.node(id)?.changed.emit(());
        Ok(())
    }

    fn validate_children(&self, id: HeaderId, children: Option<&[HeaderId]>) -> HeaderResult<()> {
        self.node(id)?;
        let Some(children) = children else {
            return Ok(());
        };

        let mut seen = HashSet::with_capacity(children.len());
        for &child in children {
            let child_node = self.node(child)?;
            if !seen.insert(child) {
                return Err(HeaderError::DuplicateChild(child));
            }
            if child == id || self.is_ancestor_of(child, id) {
                return Err(HeaderError::CircularParentage { parent: id, child });
            }
            if let Some(owner) = child_node.parent {
                if owner != id && self.lists_child(owner, child) {
                    return Err(HeaderError::AlreadyParented { child, owner });
                }
            }
        }
        Ok(())
    }

    /// Whether `owner` is live and currently lists `child` among its children.
    fn lists_child(&self, owner: HeaderId, child: HeaderId) -> bool {
        self.nodes
            .get(owner)
            .and_then(|n| n.children.as_ref())
            .is_some_and(|c| c.contains(&child))
    }

    /// Check if `potential_ancestor` is on the attached parent chain of `id`.
    fn is_ancestor_of(&self, potential_ancestor: HeaderId, id: HeaderId) -> bool {
        let mut current = self.attached_parent(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.attached_parent(current_id);
        }
        false
    }

    /// Link `children` under `id`. The list must already be validated.
    fn install_children(&mut self, id: HeaderId, children: Vec<HeaderId>) {
        let Some(parent_signal) = self.nodes.get(id).map(|n| Arc::downgrade(&n.changed)) else {
            return;
        };

        let mut connections = Vec::with_capacity(children.len());
        for (index, &child_id) in children.iter().enumerate() {
            if let Some(child) = self.nodes.get_mut(child_id) {
                child.parent = Some(id);
                child.index = Some(index);
                let parent_signal = parent_signal.clone();
                let conn = child.changed.connect(move |_| {
                    if let Some(parent_signal) = parent_signal.upgrade() {
                        parent_signal.emit(());
                    }
                });
                connections.push((child_id, conn));
            }
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.children = Some(children);
            node.child_connections = connections;
        }
    }

    /// Drop the subscriptions `id` holds on its current children.
    fn release_children(&mut self, id: HeaderId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let connections = std::mem::take(&mut node.child_connections);
        for (child_id, conn) in connections {
            if let Some(child) = self.nodes.get(child_id) {
                child.changed.disconnect(conn);
            }
        }
    }

    /// Dispose of a header.
    ///
    /// Unsubscribes from all current children, drops every listener on the
    /// header's own signal and removes it from the arena. The children are not
    /// disposed; their `parent` id now points at nothing and is treated as
    /// absent.
    #[tracing::instrument(skip(self), target = "horizon_lattice_header::tree", level = "trace")]
    pub fn dispose(&mut self, id: HeaderId) -> HeaderResult<()> {
        self.node(id)?;
        self.release_children(id);
        if let Some(node) = self.nodes.remove(id) {
            node.changed.disconnect_all();
        }
        tracing::trace!(target: targets::TREE, ?id, "disposed header");
        Ok(())
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Whether the header's children are currently revealed.
    ///
    /// Always `false` when the children list is absent or empty.
    pub fn children_expanded(&self, id: HeaderId) -> HeaderResult<bool> {
        Ok(self.node(id)?.children_expanded())
    }

    /// Expand or collapse a header.
    ///
    /// Ignored for a header whose children list is `None`. Collapsing also
    /// collapses every descendant, each of which emits its own notification;
    /// the header then emits once, whether or not the value changed.
    pub fn set_children_expanded(&mut self, id: HeaderId, expanded: bool) -> HeaderResult<()> {
        let node = self.node_mut(id)?;
        let Some(children) = node.children.clone() else {
            tracing::trace!(target: targets::TREE, ?id, "expansion ignored on leaf header");
            return Ok(());
        };
        node.children_expanded = expanded;

        if !expanded {
            for child in children {
                if self.contains(child) {
                    self.set_children_expanded(child, false)?;
                }
            }
        }

        tracing::trace!(target: targets::TREE, ?id, expanded, "set children expanded");
        self.node(id)?.changed.emit(());
        Ok(())
    }

    /// Flip the expansion state.
    pub fn toggle_expand(&mut self, id: HeaderId) -> HeaderResult<()> {
        let expanded = self.children_expanded(id)?;
        self.set_children_expanded(id, !expanded)
    }

    // =========================================================================
    // Derived State
    // =========================================================================

    /// Live children of a node, skipping ids that have been disposed.
    fn live_children<'a>(&'a self, node: &'a HeaderNode<C>) -> impl Iterator<Item = HeaderId> + 'a {
        node.children
            .iter()
            .flatten()
            .copied()
            .filter(|&child| self.nodes.contains_key(child))
    }

    /// The recorded parent, if it is live and still lists the header.
    ///
    /// Headers dropped by [`replace_children`](Self::replace_children) keep a
    /// stale `parent`; every upward walk treats them as roots.
    fn attached_parent(&self, id: HeaderId) -> Option<HeaderId> {
        self.nodes
            .get(id)
            .and_then(|n| n.parent)
            .filter(|&parent| self.lists_child(parent, id))
    }

    /// Total number of columns in the subtree, the header included, whatever
    /// their visibility.
    pub fn columns_count(&self, id: HeaderId) -> HeaderResult<usize> {
        let node = self.node(id)?;
        let mut count = 1;
        for child in self.live_children(node) {
            count += self.columns_count(child)?;
        }
        Ok(count)
    }

    /// Number of visible columns in the subtree.
    ///
    /// The header contributes 0 when it is expanded and hides itself when
    /// expanded, 1 otherwise. Children are always counted through their own
    /// flags, even under a collapsed header; see
    /// [`displayed_columns_count`](Self::displayed_columns_count) for a count
    /// that stops at collapsed headers.
    pub fn visible_columns_count(&self, id: HeaderId) -> HeaderResult<usize> {
        let node = self.node(id)?;
        let mut count = usize::from(!node.hidden_by_expansion());
        for child in self.live_children(node) {
            count += self.visible_columns_count(child)?;
        }
        Ok(count)
    }

    /// Number of columns actually on screen for the subtree.
    ///
    /// Like [`visible_columns_count`](Self::visible_columns_count), but only
    /// descends into expanded headers. For a root this equals the number of
    /// effectively visible headers in its subtree.
    pub fn displayed_columns_count(&self, id: HeaderId) -> HeaderResult<usize> {
        let node = self.node(id)?;
        let mut count = usize::from(!node.hidden_by_expansion());
        if node.children_expanded() {
            for child in self.live_children(node) {
                count += self.displayed_columns_count(child)?;
            }
        }
        Ok(count)
    }

    /// Whether the header should be rendered.
    ///
    /// False while it hides itself because it is expanded, and false when its
    /// parent is collapsed. Roots only depend on their own flags.
    pub fn is_visible(&self, id: HeaderId) -> HeaderResult<bool> {
        let node = self.node(id)?;
        if node.hidden_by_expansion() {
            return Ok(false);
        }
        match self.attached_parent(id) {
            Some(parent) => self.children_expanded(parent),
            None => Ok(true),
        }
    }

    /// Like [`is_visible`](Self::is_visible), but requires every ancestor to
    /// be expanded, not only the direct parent.
    pub fn is_effectively_visible(&self, id: HeaderId) -> HeaderResult<bool> {
        if self.node(id)?.hidden_by_expansion() {
            return Ok(false);
        }
        for ancestor in self.ancestors(id)? {
            if !self.children_expanded(ancestor)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The header's address: the sibling indices from the root down to it.
    ///
    /// The root of the chain contributes nothing; the header itself
    /// contributes its index, or [`UNASSIGNED_INDEX`] if it has none.
    /// A lone root is `[-1]`, the third child of a root is `[2]`.
    pub fn address(&self, id: HeaderId) -> HeaderResult<Vec<isize>> {
        let node = self.node(id)?;
        let mut ancestors = self.ancestors(id)?;
        ancestors.pop();
        let mut address: Vec<isize> = ancestors
            .into_iter()
            .rev()
            .map(|ancestor| {
                self.nodes
                    .get(ancestor)
                    .and_then(|n| n.index)
                    .map_or(UNASSIGNED_INDEX, |index| index as isize)
            })
            .collect();
        address.push(node.index.map_or(UNASSIGNED_INDEX, |index| index as isize));
        Ok(address)
    }

    /// Follow a path of child indices down from `id`.
    ///
    /// An empty path yields `id`. For a root, `header_at(root, path)`
    /// finds the header whose [`address`](Self::address) is `path`.
    pub fn header_at(&self, id: HeaderId, path: &[usize]) -> HeaderResult<Option<HeaderId>> {
        let mut current = self.node(id).map(|_| id)?;
        for &index in path {
            let next = self
                .node(current)?
                .children
                .as_ref()
                .and_then(|c| c.get(index))
                .copied()
                .filter(|&child| self.contains(child));
            match next {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The header's cell payload.
    pub fn cell(&self, id: HeaderId) -> HeaderResult<&C> {
        Ok(self.node(id)?.cell())
    }

    /// The header's preferred width.
    pub fn width(&self, id: HeaderId) -> HeaderResult<Option<f32>> {
        Ok(self.node(id)?.width())
    }

    /// Whether the header hides itself while expanded.
    pub fn hide_when_expanded(&self, id: HeaderId) -> HeaderResult<bool> {
        Ok(self.node(id)?.hide_when_expanded())
    }

    /// Whether input handling should skip the default tap-to-toggle.
    pub fn disable_default_on_tap_expansion(&self, id: HeaderId) -> HeaderResult<bool> {
        Ok(self.node(id)?.disable_default_on_tap_expansion())
    }

    /// The recorded parent.
    pub fn parent(&self, id: HeaderId) -> HeaderResult<Option<HeaderId>> {
        Ok(self.node(id)?.parent())
    }

    /// Position within the parent's children list.
    pub fn index(&self, id: HeaderId) -> HeaderResult<Option<usize>> {
        Ok(self.node(id)?.index())
    }

    // =========================================================================
    // Tree Traversal
    // =========================================================================

    /// Headers without an attached parent.
    pub fn roots(&self) -> Vec<HeaderId> {
        self.nodes
            .keys()
            .filter(|&id| self.attached_parent(id).is_none())
            .collect()
    }

    /// All ancestors from the immediate parent up to the root.
    pub fn ancestors(&self, id: HeaderId) -> HeaderResult<Vec<HeaderId>> {
        self.node(id)?;
        let mut result = Vec::new();
        let mut current = self.attached_parent(id);
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.attached_parent(current_id);
        }
        Ok(result)
    }

    /// Depth-first pre-order traversal of the whole subtree.
    pub fn depth_first_preorder(&self, id: HeaderId) -> HeaderResult<Vec<HeaderId>> {
        let mut result = Vec::new();
        self.preorder_recursive(id, false, &mut result)?;
        Ok(result)
    }

    /// Headers currently on screen in the subtree, in column order.
    ///
    /// Skips headers hidden by their own expansion and does not descend into
    /// collapsed headers. The length matches
    /// [`displayed_columns_count`](Self::displayed_columns_count).
    pub fn visible_preorder(&self, id: HeaderId) -> HeaderResult<Vec<HeaderId>> {
        let mut result = Vec::new();
        self.preorder_recursive(id, true, &mut result)?;
        Ok(result)
    }

    fn preorder_recursive(
        &self,
        id: HeaderId,
        displayed_only: bool,
        result: &mut Vec<HeaderId>,
    ) -> HeaderResult<()> {
        let node = self.node(id)?;
        if !displayed_only || !node.hidden_by_expansion() {
            result.push(id);
        }
        if displayed_only && !node.children_expanded() {
            return Ok(());
        }
        for child in self.live_children(node) {
            self.preorder_recursive(child, displayed_only, result)?;
        }
        Ok(())
    }

    // =========================================================================
    // Change Notification
    // =========================================================================

    /// The header's change signal.
    pub fn signal(&self, id: HeaderId) -> HeaderResult<Arc<Signal<()>>> {
        Ok(self.node(id)?.changed.clone())
    }

    /// Listen for changes at or below a header.
    pub fn connect<F>(&self, id: HeaderId, slot: F) -> HeaderResult<ConnectionId>
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        Ok(self.node(id)?.changed.connect(slot))
    }

    /// Like [`connect`](Self::connect), disconnecting when the guard drops.
    pub fn connect_scoped<F>(&self, id: HeaderId, slot: F) -> HeaderResult<ConnectionGuard<()>>
    where
        F: Fn(&()) + Send + Sync + 'static,
    {
        Ok(self.node(id)?.changed.connect_scoped(slot))
    }

    /// Remove a listener. Returns `true` if it was connected.
    pub fn disconnect(&self, id: HeaderId, conn: ConnectionId) -> HeaderResult<bool> {
        Ok(self.node(id)?.changed.disconnect(conn))
    }
}

/// A thread-safe wrapper around [`HeaderTree`].
///
/// Provides concurrent read access with exclusive write access via `RwLock`,
/// giving each tree a single writer. Listeners run while the write lock is
/// held and must not lock the same tree again.
pub struct SharedHeaderTree<C> {
    inner: RwLock<HeaderTree<C>>,
}

impl<C> SharedHeaderTree<C> {
    /// Create a new shared, empty tree.
    pub fn new() -> Self {
        Self::from_tree(HeaderTree::new())
    }

    /// Wrap an existing tree.
    pub fn from_tree(tree: HeaderTree<C>) -> Self {
        Self {
            inner: RwLock::new(tree),
        }
    }

    /// Unwrap the tree.
    pub fn into_inner(self) -> HeaderTree<C> {
        self.inner.into_inner()
    }

    /// Insert a header.
    pub fn insert(&self, builder: HeaderBuilder<C>) -> HeaderId {
        self.inner.write().insert(builder)
    }

    /// Replace a header's children.
    pub fn replace_children(
        &self,
        id: HeaderId,
        children: Option<Vec<HeaderId>>,
    ) -> HeaderResult<()> {
        self.inner.write().replace_children(id, children)
    }

    /// Expand or collapse a header.
    pub fn set_children_expanded(&self, id: HeaderId, expanded: bool) -> HeaderResult<()> {
        self.inner.write().set_children_expanded(id, expanded)
    }

    /// Flip a header's expansion state.
    pub fn toggle_expand(&self, id: HeaderId) -> HeaderResult<()> {
        self.inner.write().toggle_expand(id)
    }

    /// Dispose of a header.
    pub fn dispose(&self, id: HeaderId) -> HeaderResult<()> {
        self.inner.write().dispose(id)
    }

    /// Access the tree with a read lock.
    pub fn with_read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&HeaderTree<C>) -> R,
    {
        f(&self.inner.read())
    }

    /// Access the tree with a write lock.
    pub fn with_write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut HeaderTree<C>) -> R,
    {
        f(&mut self.inner.write())
    }
}

impl<C> Default for SharedHeaderTree<C> {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(HeaderTree<String>: Send, Sync);
static_assertions::assert_impl_all!(SharedHeaderTree<String>: Send, Sync);
