//! Logging and debugging facilities for header trees.
//!
//! This module provides:
//! - Target names for filtering this crate's `tracing` output
//! - [`HeaderTreeDebug`], a text visualization of a header subtree
//!
//! The crate only emits `trace!` events; install a subscriber in the
//! application to see them:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_lattice_header=trace")
//!     .init();
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::error::HeaderResult;
use crate::header::HeaderId;
use crate::tree::HeaderTree;

/// Target names for log filtering.
pub mod targets {
    /// Crate-wide target.
    pub const HEADER: &str = "horizon_lattice_header";
    /// Tree construction, children replacement, expansion and disposal.
    pub const TREE: &str = "horizon_lattice_header::tree";
    /// Change signal emission.
    pub const SIGNAL: &str = "horizon_lattice_header::signal";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line prefixes.
    Compact,
}

/// Configuration for header tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show header ids.
    pub show_ids: bool,
    /// Whether to show each header's address.
    pub show_addresses: bool,
    /// Whether to show displayed/total column counts.
    pub show_counts: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: false,
            show_addresses: true,
            show_counts: false,
            max_depth: None,
        }
    }
}

impl TreeFormatOptions {
    /// Everything turned on.
    pub fn detailed() -> Self {
        Self {
            show_ids: true,
            show_counts: true,
            ..Default::default()
        }
    }

    /// Labels and expansion markers only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_addresses: false,
            show_counts: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing header trees.
///
/// Each line shows an expansion marker (`[+]` collapsed, `[-]` expanded,
/// nothing for a leaf), the header label, and optionally its id, address and
/// `displayed/total` column counts. Headers that are not currently visible are
/// tagged `(hidden)`.
///
/// ```
/// use horizon_lattice_header::{HeaderBuilder, HeaderTree, HeaderTreeDebug};
///
/// let mut tree = HeaderTree::new();
/// let root = tree.insert(HeaderBuilder::new("Name").child(HeaderBuilder::new("First")));
/// let dump = HeaderTreeDebug::new().format_subtree(&tree, root).unwrap();
/// assert!(dump.starts_with("[+] Name"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HeaderTreeDebug {
    options: TreeFormatOptions,
}

impl HeaderTreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format every root of the arena.
    pub fn format_all<C: fmt::Display>(&self, tree: &HeaderTree<C>) -> HeaderResult<String> {
        let roots = tree.roots();
        let mut output = String::new();
        writeln!(output, "Header Tree ({} total headers):", tree.len()).expect("write to String");

        if roots.is_empty() {
            writeln!(output, "  (empty)").expect("write to String");
        } else {
            for root in roots {
                self.format_into(tree, root, &mut Vec::new(), &|cell: &C| cell.to_string(), &mut output)?;
            }
        }
        Ok(output)
    }

    /// Format a subtree using the cell's `Display` output as the label.
    pub fn format_subtree<C: fmt::Display>(
        &self,
        tree: &HeaderTree<C>,
        root: HeaderId,
    ) -> HeaderResult<String> {
        self.format_subtree_with(tree, root, |cell| cell.to_string())
    }

    /// Format a subtree with a custom label for each cell.
    pub fn format_subtree_with<C, F>(
        &self,
        tree: &HeaderTree<C>,
        root: HeaderId,
        label: F,
    ) -> HeaderResult<String>
    where
        F: Fn(&C) -> String,
    {
        let mut output = String::new();
        self.format_into(tree, root, &mut Vec::new(), &label, &mut output)?;
        Ok(output)
    }

    /// `last_flags` holds, from the top down, whether each header on the
    /// path to `id` (excluding the subtree root) is the last of its siblings.
    fn format_into<C>(
        &self,
        tree: &HeaderTree<C>,
        id: HeaderId,
        last_flags: &mut Vec<bool>,
        label: &dyn Fn(&C) -> String,
        output: &mut String,
    ) -> HeaderResult<()> {
        if let Some(max) = self.options.max_depth {
            if last_flags.len() > max {
                return Ok(());
            }
        }

        let node = tree.node(id)?;
        output.push_str(&self.build_prefix(last_flags));

        if node.has_children() {
            output.push_str(if node.children_expanded() { "[-] " } else { "[+] " });
        }
        output.push_str(&label(node.cell()));

        if self.options.show_ids {
            write!(output, " [{:?}]", id).expect("write to String");
        }
        if self.options.show_addresses {
            write!(output, " @{:?}", tree.address(id)?).expect("write to String");
        }
        if self.options.show_counts {
            write!(
                output,
                " {}/{}",
                tree.displayed_columns_count(id)?,
                tree.columns_count(id)?
            )
            .expect("write to String");
        }
        if !tree.is_visible(id)? {
            output.push_str(" (hidden)");
        }
        output.push('\n');

        let children: Vec<HeaderId> = node
            .children()
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&child| tree.contains(child))
            .collect();
        let child_count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            last_flags.push(i + 1 == child_count);
            let result = self.format_into(tree, child, last_flags, label, output);
            last_flags.pop();
            result?;
        }
        Ok(())
    }

    /// Build the prefix string for a tree line.
    ///
    /// Ancestor levels are padded to the connector's width: blank below a
    /// last child, a branch bar otherwise.
    fn build_prefix(&self, last_flags: &[bool]) -> String {
        let Some((&is_last, ancestors)) = last_flags.split_last() else {
            return String::new();
        };

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+--", "`--"),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500}", "\u{2514}\u{2500}\u{2500}"),
            TreeStyle::Compact => ("", "-", "-"),
        };

        let width = corner.chars().count() + 1;
        let mut prefix = String::new();
        for &ancestor_is_last in ancestors {
            let pad = if ancestor_is_last {
                width
            } else {
                prefix.push_str(branch);
                width - branch.chars().count()
            };
            prefix.extend(std::iter::repeat_n(' ', pad));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix.push(' ');
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderBuilder;

    fn sample() -> (HeaderTree<&'static str>, HeaderId) {
        let mut tree = HeaderTree::new();
        let root = tree.insert(
            HeaderBuilder::new("root")
                .children_expanded(true)
                .child(HeaderBuilder::new("a"))
                .child(HeaderBuilder::new("b").child(HeaderBuilder::new("c"))),
        );
        (tree, root)
    }

    #[test]
    fn test_format_empty() {
        let tree = HeaderTree::<&str>::new();
        let output = HeaderTreeDebug::new().format_all(&tree).unwrap();
        assert!(output.contains("Header Tree (0 total headers)"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_format_hierarchy() {
        let (tree, root) = sample();
        let output = HeaderTreeDebug::new().format_subtree(&tree, root).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[-] root @[-1]");
        assert!(lines[1].ends_with("a @[0]"));
        assert!(lines[2].ends_with("[+] b @[1]"));
        assert!(lines[3].ends_with("c @[1, 0] (hidden)"));
    }

    #[test]
    fn test_format_minimal_ascii() {
        let (tree, root) = sample();
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::minimal()
        };
        let output = HeaderTreeDebug::with_options(options)
            .format_subtree(&tree, root)
            .unwrap();

        assert_eq!(output, "[-] root\n+-- a\n`-- [+] b\n    `-- c (hidden)\n");
    }

    #[test]
    fn test_format_nested_branches_align() {
        let mut tree = HeaderTree::new();
        let root = tree.insert(
            HeaderBuilder::new("root")
                .child(
                    HeaderBuilder::new("a")
                        .child(HeaderBuilder::new("a0").child(HeaderBuilder::new("a00")))
                        .child(HeaderBuilder::new("a1")),
                )
                .child(HeaderBuilder::new("b")),
        );
        let options = TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::minimal()
        };
        let output = HeaderTreeDebug::with_options(options)
            .format_subtree(&tree, root)
            .unwrap();

        let expected = "\
[+] root
+-- [+] a (hidden)
|   +-- [+] a0 (hidden)
|   |   `-- a00 (hidden)
|   `-- a1 (hidden)
`-- b (hidden)
";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_format_counts_and_depth() {
        let (tree, root) = sample();
        let options = TreeFormatOptions {
            max_depth: Some(0),
            ..TreeFormatOptions::detailed()
        };
        let output = HeaderTreeDebug::with_options(options)
            .format_subtree(&tree, root)
            .unwrap();

        assert_eq!(output.lines().count(), 1);
        assert!(output.contains(" 3/4"));
    }

    #[test]
    fn test_format_with_custom_label() {
        let (tree, root) = sample();
        let output = HeaderTreeDebug::with_options(TreeFormatOptions::minimal())
            .format_subtree_with(&tree, root, |cell| cell.to_uppercase())
            .unwrap();
        assert!(output.starts_with("[-] ROOT\n"));
    }
}
