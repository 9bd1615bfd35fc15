//! Handlers for change batches.
//!
//! Each of the engine's observers has one handler:
//!
//! - [`sync`] keeps clones in step with their references. A child-list change
//!   throws away and regenerates the children of every clone, freeing the old
//!   ones; an attribute change is copied verbatim.
//! - [`relocate`] moves use-copies along with their `use` element when the
//!   element is moved inside its owning `svg`.
//! - [`requery`] re-runs traversal when content under the use root changes.
//!
//! A failure while handling one record is logged and does not stop the batch.

use log::{debug, trace, warn};

use umbra_core::{
    dom::NodeId,
    name::Name,
    observer::{MutationKind, MutationRecord},
};

use crate::{
    context::Context,
    error::UmbraError,
    geometry::{GeometryKey, xywh},
    linker::{link, tolerate_parity, unlink},
    rewrite::{Rewrite, rewrite_children},
    traverse::query,
    vocab,
};

/// Handles a batch delivered to the sync observer.
pub(crate) fn sync(cx: &mut Context<'_>, records: Vec<MutationRecord>) {
    for record in records {
        trace!(record:?; "Sync record");
        let target = record.target();
        let result = match record.kind() {
            MutationKind::ChildList { .. } => regenerate(cx, target),
            MutationKind::Attributes { name } => propagate(cx, target, *name),
        };
        if let Err(err) = result {
            warn!(target:?, err:err; "Failed to sync clones");
        }
    }
}

/// Replaces the children of every clone of `reference` with fresh copies.
fn regenerate(cx: &mut Context<'_>, reference: NodeId) -> Result<(), UmbraError> {
    // A use-copy's last child is its ref-copy, which a copy of the `use`
    // element's own children would drop.
    if cx.doc.is_element_named(reference, vocab::USE) {
        debug!(reference:?; "Ignoring child-list change on use element");
        return Ok(());
    }

    for clone in cx.state.clones(reference) {
        debug!(reference:?, clone:?; "Regenerating clone");
        tolerate_parity(unlink(cx, reference, clone))?;
        let stale = cx.doc.children(clone).to_vec();
        let copies = rewrite_children(cx.doc, reference, Rewrite::ReferencesOnly)?;
        cx.doc.replace_children(clone, copies)?;
        tolerate_parity(link(cx, reference, clone))?;
        discard_stale(cx, stale)?;
    }
    Ok(())
}

/// Frees old clone children that nothing re-attached.
fn discard_stale(cx: &mut Context<'_>, stale: Vec<NodeId>) -> Result<(), UmbraError> {
    for node in stale {
        if cx.doc.contains(node) && cx.doc.parent(node).is_none() {
            let freed = cx.doc.discard(node)?;
            trace!(node:?, freed; "Freed stale clone subtree");
        }
    }
    Ok(())
}

/// Copies attribute `name` of `reference` onto its clones.
fn propagate(cx: &mut Context<'_>, reference: NodeId, name: Name) -> Result<(), UmbraError> {
    let is_use = cx.doc.is_element_named(reference, vocab::USE);
    // Markers are per node, and a `use` element's visibility belongs to the
    // engine once it has been cloned.
    if name == cx.reference_marker()
        || name == cx.clone_marker()
        || (is_use && name == vocab::VISIBILITY)
    {
        return Ok(());
    }

    let value = cx.doc.attribute(reference, name).map(str::to_string);
    let key = GeometryKey::from_attribute(&name.as_string());
    let is_size = matches!(key, Some(GeometryKey::Width | GeometryKey::Height));
    for clone in cx.state.clones(reference) {
        match &value {
            Some(value) => cx.doc.set_attribute(clone, name, value.as_str())?,
            None => {
                cx.doc.remove_attribute(clone, name)?;
            }
        }
        // Keep `use` size overrides on ref-copies.
        match cx.state.ref_copy_owner(clone) {
            Some(owner) if is_size => xywh(cx, owner, key)?,
            _ => {}
        }
    }

    if key.is_some() && is_use {
        xywh(cx, reference, key)?;
    }
    Ok(())
}

/// Handles a batch delivered to the move observer.
pub(crate) fn relocate(cx: &mut Context<'_>, records: Vec<MutationRecord>) {
    for record in records {
        let MutationKind::ChildList { added, removed } = record.kind() else {
            continue;
        };
        let container = record.target();
        for node in removed {
            if let Err(err) = detach_copy(cx, container, *node) {
                warn!(container:?, node:?, err:err; "Failed to detach use-copy");
            }
        }
        for node in added {
            if let Err(err) = attach_copy(cx, container, *node) {
                warn!(container:?, node:?, err:err; "Failed to attach use-copy");
            }
        }
    }
}

fn use_copy_of(cx: &Context<'_>, node: NodeId) -> Option<NodeId> {
    if !cx.doc.is_element_named(node, vocab::USE) {
        return None;
    }
    cx.state.use_record(node).map(|record| record.use_copy)
}

fn detach_copy(cx: &mut Context<'_>, container: NodeId, node: NodeId) -> Result<(), UmbraError> {
    let Some(use_copy) = use_copy_of(cx, node) else {
        return Ok(());
    };
    if cx.doc.parent(use_copy) == Some(container) {
        debug!(use_node:? = node, use_copy:?; "Detaching use-copy");
        cx.doc.remove_child(container, use_copy)?;
    }
    Ok(())
}

fn attach_copy(cx: &mut Context<'_>, container: NodeId, node: NodeId) -> Result<(), UmbraError> {
    let Some(use_copy) = use_copy_of(cx, node) else {
        return Ok(());
    };
    // The use element may have moved on again since this record was queued.
    if cx.doc.parent(node) != Some(container) {
        return Ok(());
    }
    debug!(use_node:? = node, use_copy:?; "Attaching use-copy");
    cx.doc.insert_before(container, use_copy, Some(node))?;
    Ok(())
}

/// Handles a batch delivered to the root observer.
pub(crate) fn requery(
    cx: &mut Context<'_>,
    records: Vec<MutationRecord>,
    use_root: NodeId,
    ref_root: NodeId,
) {
    if records.is_empty() {
        return;
    }
    debug!(records = records.len(); "Content changed under use root");
    query(cx, use_root, ref_root);
}
