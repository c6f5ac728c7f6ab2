//! Header node storage and construction parameters.
//!
//! A [`HeaderNode`] is one column header inside a [`HeaderTree`](crate::HeaderTree).
//! Nodes are created from a [`HeaderBuilder`] and addressed through a
//! [`HeaderId`]; all mutation goes through the tree so the parent/index links
//! and change subscriptions stay consistent.

use std::fmt;
use std::sync::Arc;

use slotmap::new_key_type;

use crate::signal::{ConnectionId, Signal};

new_key_type! {
    /// A stable handle to a header node in a [`HeaderTree`](crate::HeaderTree).
    ///
    /// Ids become invalid once the header is disposed; a disposed id is never
    /// reused for another header.
    pub struct HeaderId;
}

/// Index reported in an address for a header that has no parent slot.
pub const UNASSIGNED_INDEX: isize = -1;

/// One column header and its tree links.
///
/// The immutable configuration (cell, width, flags) is readable here. Derived
/// state such as visibility, address and column counts lives on the tree,
/// since it depends on other nodes.
pub struct HeaderNode<C> {
    pub(crate) cell: C,
    /// Owned child ids; `None` marks a leaf column.
    pub(crate) children: Option<Vec<HeaderId>>,
    pub(crate) width: Option<f32>,
    pub(crate) hide_when_expanded: bool,
    pub(crate) disable_default_on_tap_expansion: bool,
    /// Stored flag; only observable while `children` is non-empty.
    pub(crate) children_expanded: bool,
    /// Back-reference only. May point at a disposed header.
    pub(crate) parent: Option<HeaderId>,
    pub(crate) index: Option<usize>,
    pub(crate) changed: Arc<Signal<()>>,
    /// Subscriptions this node holds on its children's signals.
    pub(crate) child_connections: Vec<(HeaderId, ConnectionId)>,
}

impl<C> HeaderNode<C> {
    fn new(
        cell: C,
        width: Option<f32>,
        hide_when_expanded: bool,
        children_expanded: bool,
        disable_default_on_tap_expansion: bool,
    ) -> Self {
        Self {
            cell,
            children: None,
            width,
            hide_when_expanded,
            disable_default_on_tap_expansion,
            children_expanded,
            parent: None,
            index: None,
            changed: Arc::new(Signal::new()),
            child_connections: Vec::new(),
        }
    }

    /// The caller-supplied cell payload.
    pub fn cell(&self) -> &C {
        &self.cell
    }

    /// The child ids, or `None` for a leaf column.
    pub fn children(&self) -> Option<&[HeaderId]> {
        self.children.as_deref()
    }

    /// Preferred width; `None` means the table's default applies.
    pub fn width(&self) -> Option<f32> {
        self.width
    }

    /// Whether the header itself disappears while its children are shown.
    pub fn hide_when_expanded(&self) -> bool {
        self.hide_when_expanded
    }

    /// Whether input handling should skip the default tap-to-toggle behavior.
    pub fn disable_default_on_tap_expansion(&self) -> bool {
        self.disable_default_on_tap_expansion
    }

    /// Whether the children are currently revealed.
    ///
    /// Always `false` for a header without children, whatever was assigned.
    pub fn children_expanded(&self) -> bool {
        self.children_expanded && self.has_children()
    }

    /// Whether the header has a non-empty children list.
    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// The recorded parent id, if the header was ever installed as a child.
    pub fn parent(&self) -> Option<HeaderId> {
        self.parent
    }

    /// Position within the parent's children list.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// True when this header hides itself because it is expanded.
    pub(crate) fn hidden_by_expansion(&self) -> bool {
        self.children_expanded() && self.hide_when_expanded
    }
}

impl<C: fmt::Debug> fmt::Debug for HeaderNode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeaderNode")
            .field("cell", &self.cell)
            .field("children", &self.children)
            .field("width", &self.width)
            .field("hide_when_expanded", &self.hide_when_expanded)
            .field("children_expanded", &self.children_expanded)
            .field("parent", &self.parent)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Construction parameters for a header and, recursively, its children.
///
/// Defaults: no children (leaf), no width, not hidden when expanded,
/// collapsed, default tap expansion enabled.
///
/// # Example
///
/// ```
/// use horizon_lattice_header::{HeaderBuilder, HeaderTree};
///
/// let mut tree = HeaderTree::new();
/// let root = tree.insert(
///     HeaderBuilder::new("Address")
///         .width(180.0)
///         .child(HeaderBuilder::new("Street"))
///         .child(HeaderBuilder::new("City")),
/// );
/// assert_eq!(tree.columns_count(root).unwrap(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct HeaderBuilder<C> {
    pub(crate) cell: C,
    pub(crate) children: Option<Vec<HeaderBuilder<C>>>,
    pub(crate) width: Option<f32>,
    pub(crate) hide_when_expanded: bool,
    pub(crate) children_expanded: bool,
    pub(crate) disable_default_on_tap_expansion: bool,
}

impl<C> HeaderBuilder<C> {
    /// Start a header with the given cell payload.
    pub fn new(cell: C) -> Self {
        Self {
            cell,
            children: None,
            width: None,
            hide_when_expanded: false,
            children_expanded: false,
            disable_default_on_tap_expansion: false,
        }
    }

    /// Set the full children list. An empty list is kept as an empty
    /// (non-leaf) list, which still never reports itself expanded.
    pub fn children(mut self, children: impl IntoIterator<Item = HeaderBuilder<C>>) -> Self {
        self.children = Some(children.into_iter().collect());
        self
    }

    /// Append one child.
    pub fn child(mut self, child: HeaderBuilder<C>) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Set the preferred width.
    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    /// Hide this header from the column count while it is expanded.
    pub fn hide_when_expanded(mut self, hide: bool) -> Self {
        self.hide_when_expanded = hide;
        self
    }

    /// Initial expansion state.
    pub fn children_expanded(mut self, expanded: bool) -> Self {
        self.children_expanded = expanded;
        self
    }

    /// Tell input handling to run custom logic instead of toggling on tap.
    pub fn disable_default_on_tap_expansion(mut self, disable: bool) -> Self {
        self.disable_default_on_tap_expansion = disable;
        self
    }

    /// Split into the node itself and its pending child builders.
    pub(crate) fn into_parts(self) -> (HeaderNode<C>, Option<Vec<HeaderBuilder<C>>>) {
        let node = HeaderNode::new(
            self.cell,
            self.width,
            self.hide_when_expanded,
            self.children_expanded,
            self.disable_default_on_tap_expansion,
        );
        (node, self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let (node, children) = HeaderBuilder::new("a").into_parts();
        assert!(children.is_none());
        assert_eq!(*node.cell(), "a");
        assert_eq!(node.width(), None);
        assert!(!node.hide_when_expanded());
        assert!(!node.disable_default_on_tap_expansion());
        assert!(!node.children_expanded());
        assert_eq!(node.parent(), None);
        assert_eq!(node.index(), None);
    }

    #[test]
    fn test_builder_flags() {
        let (node, children) = HeaderBuilder::new(1u32)
            .width(42.5)
            .hide_when_expanded(true)
            .disable_default_on_tap_expansion(true)
            .children_expanded(true)
            .child(HeaderBuilder::new(2))
            .child(HeaderBuilder::new(3))
            .into_parts();

        assert_eq!(node.width(), Some(42.5));
        assert!(node.hide_when_expanded());
        assert!(node.disable_default_on_tap_expansion());
        assert_eq!(children.map(|c| c.len()), Some(2));
    }

    #[test]
    fn test_expansion_masked_without_children() {
        let (mut node, _) = HeaderBuilder::new(()).children_expanded(true).into_parts();
        assert!(!node.children_expanded());
        assert!(!node.hidden_by_expansion());

        node.children = Some(Vec::new());
        assert!(!node.children_expanded());
    }

    #[test]
    fn test_empty_children_list_is_not_leaf() {
        let (_, children) = HeaderBuilder::<()>::new(()).children(Vec::new()).into_parts();
        assert_eq!(children.map(|c| c.len()), Some(0));
    }
}
