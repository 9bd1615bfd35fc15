//! Error types for document tree operations.

use thiserror::Error;

use crate::dom::NodeId;

/// Errors raised by structural and attribute operations on a
/// [`Document`](crate::dom::Document).
///
/// These mirror the failure modes of a DOM tree: inserting a node somewhere
/// it cannot live, or addressing a child through the wrong parent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} does not exist in this document")]
    UnknownNode(NodeId),

    #[error("node {child:?} cannot be inserted into {parent:?}")]
    HierarchyRequest { parent: NodeId, child: NodeId },

    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0:?} is still attached")]
    Attached(NodeId),
}
