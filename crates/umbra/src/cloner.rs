//! Materialization of clone subtrees.

use std::collections::HashSet;

use log::{debug, info};

use umbra_core::{dom::NodeId, observer::ObserveOptions};

use crate::{
    context::Context,
    error::UmbraError,
    geometry::xywh,
    linker::{link, tolerate_parity},
    rewrite::{Rewrite, rewrite_copy},
    state::UseRecord,
    vocab,
};

/// Builds the clone subtree for `use_node` resolved to `target`.
///
/// The use-copy is inserted right before `use_node`, which is hidden but left
/// in place. The ref-copy becomes the last child of the use-copy. Both pairs
/// are linked and observed so later changes reach the clones.
///
/// # Errors
///
/// - [`UmbraError::UnresolvedChain`] if `target` is a `use` element that has
///   not been cloned itself. Nothing is mutated in that case.
/// - [`UmbraError::Detached`] if `use_node` has no parent.
/// - [`UmbraError::CyclicReference`] if changes under the parent of
///   `use_node` already reach a clone inside the copy source. The new clone
///   would then regenerate itself on every flush.
pub(crate) fn clone_use(
    cx: &mut Context<'_>,
    use_node: NodeId,
    target: NodeId,
) -> Result<(), UmbraError> {
    let source = if cx.doc.is_element_named(target, vocab::USE) {
        cx.state
            .use_record(target)
            .map(|record| record.use_copy)
            .ok_or(UmbraError::UnresolvedChain(use_node))?
    } else {
        target
    };
    let parent = cx
        .doc
        .parent(use_node)
        .ok_or(UmbraError::Detached(use_node))?;
    if feeds_back(cx, parent, source) {
        return Err(UmbraError::CyclicReference(use_node));
    }

    let container = match cx.doc.closest_ancestor_named(use_node, vocab::SVG) {
        Some(svg) => svg,
        None => {
            debug!(use_node:?; "Use element outside any svg, watching its parent");
            parent
        }
    };
    cx.doc.observe(
        cx.observers.moves,
        container,
        ObserveOptions::child_list().with_subtree(),
    );

    let use_copy = rewrite_copy(cx.doc, use_node, Rewrite::Full)?;
    cx.doc.insert_before(parent, use_copy, Some(use_node))?;
    cx.doc
        .set_attribute(use_node, vocab::VISIBILITY, vocab::HIDDEN)?;
    tolerate_parity(link(cx, use_node, use_copy))?;
    cx.doc
        .observe(cx.observers.sync, use_node, ObserveOptions::attributes());

    let ref_copy = rewrite_copy(cx.doc, source, Rewrite::Full)?;
    cx.doc.append_child(use_copy, ref_copy)?;
    cx.doc
        .set_attribute(source, vocab::VISIBILITY, vocab::DEFAULT)?;
    tolerate_parity(link(cx, source, ref_copy))?;
    cx.doc.observe(
        cx.observers.sync,
        source,
        ObserveOptions::all().with_subtree(),
    );

    cx.state.set_use_record(
        use_node,
        UseRecord {
            use_copy,
            ref_copy,
            source,
        },
    );
    xywh(cx, use_node, None)?;

    info!(use_node:?, use_copy:?, ref_copy:?, source:?; "Cloned use element");
    Ok(())
}

/// Returns `true` if a change under `node` reaches a clone inside `source`.
///
/// A change propagates to the clones of every inclusive ancestor of the
/// changed node, and from each of those clones onwards the same way.
fn feeds_back(cx: &Context<'_>, node: NodeId, source: NodeId) -> bool {
    let mut pending = vec![node];
    let mut seen = HashSet::new();
    while let Some(node) = pending.pop() {
        if !seen.insert(node) {
            continue;
        }
        for reference in std::iter::once(node).chain(cx.doc.ancestors(node)) {
            for clone in cx.state.clones(reference) {
                if cx.doc.is_inclusive_ancestor(source, clone) {
                    return true;
                }
                pending.push(clone);
            }
        }
    }
    false
}
