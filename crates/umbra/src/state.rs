//! Engine-owned per-node bookkeeping.
//!
//! The host tree knows nothing about clones. Everything the engine needs to
//! remember about a node lives here, keyed by [`NodeId`]:
//!
//! - whether a `use` element has been resolved ([`NodeState::visited`])
//! - the clones mirroring a reference node, in link order
//! - the reference node a clone mirrors
//! - for each cloned `use` element, its use-copy, ref-copy and copy source
//!
//! A node whose state returns to the default is dropped from the table.

use std::collections::HashMap;

use indexmap::IndexSet;

use umbra_core::dom::NodeId;

/// Bookkeeping for a single node.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NodeState {
    /// The node is a `use` element that traversal has already resolved.
    pub visited: bool,
    /// Clone nodes mirroring this node, in the order they were linked.
    pub clones: IndexSet<NodeId>,
    /// The reference node this node mirrors, if it is a clone.
    pub back_ref: Option<NodeId>,
}

/// The clone subtree materialized for one `use` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseRecord {
    /// Mirrors the `use` element; carries the positional transform.
    pub use_copy: NodeId,
    /// Mirrors the copy source; last child of `use_copy`; carries sizes.
    pub ref_copy: NodeId,
    /// What `ref_copy` was copied from: the resolved target, or the target's
    /// own use-copy when the target is itself a `use` element.
    pub source: NodeId,
}

/// Side table mapping node handles to engine state.
#[derive(Debug, Default)]
pub(crate) struct SideTable {
    nodes: HashMap<NodeId, NodeState>,
    uses: HashMap<NodeId, UseRecord>,
    /// Ref-copy to the `use` element that owns it.
    owners: HashMap<NodeId, NodeId>,
}

impl SideTable {
    pub(crate) fn state(&self, id: NodeId) -> Option<&NodeState> {
        self.nodes.get(&id)
    }

    fn state_mut(&mut self, id: NodeId) -> &mut NodeState {
        self.nodes.entry(id).or_default()
    }

    pub(crate) fn is_visited(&self, id: NodeId) -> bool {
        self.state(id).is_some_and(|state| state.visited)
    }

    pub(crate) fn set_visited(&mut self, id: NodeId, visited: bool) {
        self.state_mut(id).visited = visited;
        self.prune(id);
    }

    fn prune(&mut self, id: NodeId) {
        if self.nodes.get(&id).is_some_and(|state| *state == NodeState::default()) {
            self.nodes.remove(&id);
        }
    }

    /// Returns the number of nodes with engine state.
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Snapshot of the clones of `id`, safe to hold across mutations.
    pub(crate) fn clones(&self, id: NodeId) -> Vec<NodeId> {
        self.state(id)
            .map(|state| state.clones.iter().copied().collect())
            .unwrap_or_default()
    }

    pub(crate) fn add_clone(&mut self, reference: NodeId, clone: NodeId) {
        self.state_mut(reference).clones.insert(clone);
        self.state_mut(clone).back_ref = Some(reference);
    }

    pub(crate) fn remove_clone(&mut self, reference: NodeId, clone: NodeId) {
        if let Some(state) = self.nodes.get_mut(&reference) {
            state.clones.shift_remove(&clone);
        }
        if let Some(state) = self.nodes.get_mut(&clone) {
            state.back_ref = None;
        }
        self.prune(reference);
        self.prune(clone);
    }

    pub(crate) fn back_ref(&self, clone: NodeId) -> Option<NodeId> {
        self.state(clone).and_then(|state| state.back_ref)
    }

    pub(crate) fn use_record(&self, use_node: NodeId) -> Option<UseRecord> {
        self.uses.get(&use_node).copied()
    }

    pub(crate) fn set_use_record(&mut self, use_node: NodeId, record: UseRecord) {
        self.owners.insert(record.ref_copy, use_node);
        self.uses.insert(use_node, record);
    }

    /// Returns the `use` element whose ref-copy is `ref_copy`.
    pub(crate) fn ref_copy_owner(&self, ref_copy: NodeId) -> Option<NodeId> {
        self.owners.get(&ref_copy).copied()
    }
}
