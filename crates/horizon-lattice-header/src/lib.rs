//! Observable header trees for Horizon Lattice tables.
//!
//! This crate models the column header structure of an expandable table:
//!
//! - **Header Tree**: Arena of header nodes with parent/index links
//! - **Expansion**: Expand/collapse with cascading collapse of descendants
//! - **Derived State**: Visibility, address and column counts, computed on demand
//! - **Change Notification**: Per-header signals chained upward to every ancestor
//!
//! Layout, painting and gesture handling live in the widgets that read this
//! model. They re-query the derived values after every change notification.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_header::{HeaderBuilder, HeaderTree};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let mut tree = HeaderTree::new();
//! let root = tree.insert(
//!     HeaderBuilder::new("Contact")
//!         .hide_when_expanded(true)
//!         .child(HeaderBuilder::new("Email").width(200.0))
//!         .child(HeaderBuilder::new("Phone")),
//! );
//!
//! let changes = Arc::new(AtomicUsize::new(0));
//! let changes_clone = changes.clone();
//! tree.connect(root, move |_| {
//!     changes_clone.fetch_add(1, Ordering::SeqCst);
//! })?;
//!
//! tree.toggle_expand(root)?;
//!
//! assert!(tree.children_expanded(root)?);
//! assert!(!tree.is_visible(root)?);
//! assert_eq!(tree.visible_columns_count(root)?, 2);
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//! # Ok::<(), horizon_lattice_header::HeaderError>(())
//! ```

mod error;
pub mod header;
pub mod logging;
pub mod signal;
pub mod tree;

pub use error::{HeaderError, HeaderResult};
pub use header::{HeaderBuilder, HeaderId, HeaderNode, UNASSIGNED_INDEX};
pub use logging::{HeaderTreeDebug, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use tree::{HeaderTree, SharedHeaderTree};
