//! Error types for Umbra operations.
//!
//! Errors never escape [`Engine::main`](crate::Engine::main) or
//! [`Engine::flush`](crate::Engine::flush): the engine logs them and leaves
//! the affected node to be repaired by the next relevant change batch. They
//! exist so that internal steps can use `?` and so that each degraded state
//! is reported with a precise cause.

use thiserror::Error;

use umbra_core::{DomError, dom::NodeId};
use umbra_parser::ParseError;

/// The main error type for engine operations.
#[derive(Debug, Error)]
pub enum UmbraError {
    #[error("Tree error: {0}")]
    Dom(#[from] DomError),

    #[error("Query error: {0}")]
    Query(#[from] ParseError),

    #[error(
        "Clone {clone:?} has {clone_children} children but its reference {reference:?} has {reference_children}"
    )]
    ParityViolation {
        reference: NodeId,
        clone: NodeId,
        reference_children: usize,
        clone_children: usize,
    },

    #[error("Clone {0:?} has no reference to unlink from")]
    MissingBackReference(NodeId),

    #[error("Use element {0:?} points at a use element that has no clone yet")]
    UnresolvedChain(NodeId),

    #[error("Use element {0:?} references a subtree that contains it")]
    SelfReference(NodeId),

    #[error("Use element {0:?} would feed its own clone back into its target")]
    CyclicReference(NodeId),

    #[error("Use element {0:?} is not attached to a parent")]
    Detached(NodeId),
}

impl UmbraError {
    /// Returns `true` for violations of the node-for-node correspondence
    /// between a reference subtree and its clone.
    pub fn is_parity_violation(&self) -> bool {
        matches!(
            self,
            Self::ParityViolation { .. } | Self::MissingBackReference(_)
        )
    }
}
