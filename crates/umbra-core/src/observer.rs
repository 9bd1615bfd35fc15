//! Change notification for document mutations.
//!
//! This is a MutationObserver-style service. An observer is a handle created
//! by [`Document::create_observer`] and registered on nodes with
//! [`Document::observe`]. Each registration declares its scope:
//!
//! - `subtree`: also report mutations on descendants of the registered node
//! - `child_list`: report children being added or removed
//! - `attributes`: report attribute changes
//!
//! Whether a mutation is interesting to a registration is decided at the
//! moment the mutation happens. Matching records are queued per observer and
//! handed out in batches by [`Document::take_pending`]; the document never
//! calls back into user code.

use std::collections::{BTreeMap, HashSet};

use log::trace;

use crate::{
    dom::{Document, NodeId},
    name::Name,
};

/// A handle to an observer registered with a [`Document`].
///
/// Observers are ordered by creation, which is also their delivery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u32);

/// Which mutations a registration is interested in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    /// Also observe every descendant of the registered node.
    pub subtree: bool,
    /// Report child additions and removals.
    pub child_list: bool,
    /// Report attribute changes.
    pub attributes: bool,
}

impl ObserveOptions {
    /// Child-list changes on the node only.
    pub const fn child_list() -> Self {
        Self {
            subtree: false,
            child_list: true,
            attributes: false,
        }
    }

    /// Attribute changes on the node only.
    pub const fn attributes() -> Self {
        Self {
            subtree: false,
            child_list: false,
            attributes: true,
        }
    }

    /// Both child-list and attribute changes.
    pub const fn all() -> Self {
        Self {
            subtree: false,
            child_list: true,
            attributes: true,
        }
    }

    /// Extends the registration to the node's whole subtree.
    pub const fn with_subtree(self) -> Self {
        Self {
            subtree: true,
            ..self
        }
    }

    fn accepts(&self, kind: &MutationKind) -> bool {
        match kind {
            MutationKind::ChildList { .. } => self.child_list,
            MutationKind::Attributes { .. } => self.attributes,
        }
    }
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added to and/or removed from the target.
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute of the target was set or removed.
    Attributes { name: Name },
}

/// A single mutation, as delivered to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    target: NodeId,
    kind: MutationKind,
}

impl MutationRecord {
    pub(crate) fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            target,
            kind: MutationKind::ChildList { added, removed },
        }
    }

    pub(crate) fn attribute(target: NodeId, name: Name) -> Self {
        Self {
            target,
            kind: MutationKind::Attributes { name },
        }
    }

    /// The node whose children or attributes changed.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The change itself.
    pub fn kind(&self) -> &MutationKind {
        &self.kind
    }
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    observer: ObserverId,
    target: NodeId,
    options: ObserveOptions,
}

/// Registrations and undelivered records, owned by the document.
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_observer: u32,
    registrations: Vec<Registration>,
    pending: BTreeMap<ObserverId, Vec<MutationRecord>>,
}

impl ObserverRegistry {
    pub(crate) fn forget_targets(&mut self, targets: &HashSet<NodeId>) {
        self.registrations
            .retain(|reg| !targets.contains(&reg.target));
    }
}

impl Document {
    /// Creates a new observer with no registrations.
    pub fn create_observer(&mut self) -> ObserverId {
        let id = ObserverId(self.observers.next_observer);
        self.observers.next_observer += 1;
        id
    }

    /// Registers `observer` on `target`.
    ///
    /// Observing the same node twice with one observer replaces the earlier
    /// options instead of adding a second registration.
    pub fn observe(&mut self, observer: ObserverId, target: NodeId, options: ObserveOptions) {
        trace!(observer:?, target:?, options:?; "Observe");
        let registrations = &mut self.observers.registrations;
        match registrations
            .iter_mut()
            .find(|reg| reg.observer == observer && reg.target == target)
        {
            Some(existing) => existing.options = options,
            None => registrations.push(Registration {
                observer,
                target,
                options,
            }),
        }
    }

    /// Drops the registration of `observer` on `target`, returning `true` if
    /// there was one. Records already queued stay queued.
    pub fn unobserve(&mut self, observer: ObserverId, target: NodeId) -> bool {
        let registrations = &mut self.observers.registrations;
        let before = registrations.len();
        registrations.retain(|reg| reg.observer != observer || reg.target != target);
        trace!(observer:?, target:?; "Unobserve");
        registrations.len() != before
    }

    /// Returns `true` if `observer` has a registration on exactly `target`.
    pub fn is_observing(&self, observer: ObserverId, target: NodeId) -> bool {
        self.observers
            .registrations
            .iter()
            .any(|reg| reg.observer == observer && reg.target == target)
    }

    /// Returns `true` if `observer` has undelivered records.
    pub fn has_records(&self, observer: ObserverId) -> bool {
        self.observers.pending.contains_key(&observer)
    }

    /// Returns `true` if any observer has undelivered records.
    pub fn has_pending(&self) -> bool {
        !self.observers.pending.is_empty()
    }

    /// Removes and returns the undelivered records of `observer`.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers.pending.remove(&observer).unwrap_or_default()
    }

    /// Removes and returns every pending batch, in observer creation order.
    pub fn take_pending(&mut self) -> Vec<(ObserverId, Vec<MutationRecord>)> {
        std::mem::take(&mut self.observers.pending)
            .into_iter()
            .collect()
    }

    /// Queues `record` for every observer with a matching registration.
    ///
    /// An observer receives a record at most once even when several of its
    /// registrations match.
    pub(crate) fn queue_record(&mut self, record: MutationRecord) {
        let mut interested: Vec<ObserverId> = self
            .observers
            .registrations
            .iter()
            .filter(|reg| reg.options.accepts(&record.kind))
            .filter(|reg| {
                reg.target == record.target
                    || (reg.options.subtree && self.is_inclusive_ancestor(reg.target, record.target))
            })
            .map(|reg| reg.observer)
            .collect();
        interested.sort();
        interested.dedup();

        for observer in interested {
            self.observers
                .pending
                .entry(observer)
                .or_default()
                .push(record.clone());
        }
    }
}
