//! Error types for header tree operations.

use crate::header::HeaderId;

/// Result type alias for header tree operations.
pub type HeaderResult<T> = std::result::Result<T, HeaderError>;

/// Errors that can occur while building or mutating a header tree.
///
/// Well-formed trees never produce these: they only guard against ids that
/// no longer exist and children lists that would break the tree shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// The header id is unknown or the header has been disposed.
    #[error("Invalid or disposed header id {0:?}")]
    InvalidHeaderId(HeaderId),

    /// A header cannot become a child of itself or of one of its descendants.
    #[error("Header {child:?} cannot be installed under its own descendant {parent:?}")]
    CircularParentage { parent: HeaderId, child: HeaderId },

    /// The header is currently listed as a child of another header.
    #[error("Header {child:?} already belongs to header {owner:?}")]
    AlreadyParented { child: HeaderId, owner: HeaderId },

    /// The same header appears twice in one children list.
    #[error("Header {0:?} appears more than once in the children list")]
    DuplicateChild(HeaderId),
}
