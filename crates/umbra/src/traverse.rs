//! Discovery and resolution of `use` elements.
//!
//! Traversal is depth first and post-order: before a `use` element is cloned,
//! everything under its target is resolved and cloned. A clone subtree is
//! therefore always copied from fully expanded content, and no live `use`
//! element ever ends up inside a clone.
//!
//! Failures never abort traversal. A `use` element that cannot be resolved
//! stays unvisited and is retried on the next traversal.

use log::{debug, warn};

use umbra_core::dom::NodeId;

use crate::{cloner::clone_use, context::Context, error::UmbraError, vocab};

const CANDIDATES: &str = "svg use";

/// Resolves and clones every unvisited `use` element under `scope` (or
/// `scope` itself when it is a `use` element), looking targets up in
/// `ref_scope`.
pub(crate) fn query(cx: &mut Context<'_>, scope: NodeId, ref_scope: NodeId) {
    let candidates = if cx.doc.is_element_named(scope, vocab::USE) {
        vec![scope]
    } else {
        match cx.select_all(scope, CANDIDATES) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(scope:?, err:err; "Failed to list use elements");
                return;
            }
        }
    };

    for candidate in candidates {
        if cx.state.is_visited(candidate) {
            continue;
        }
        let Some(target) = resolve(cx, candidate, ref_scope) else {
            continue;
        };
        if cx.doc.is_inclusive_ancestor(target, candidate) {
            let err = UmbraError::SelfReference(candidate);
            warn!(err:err; "Skipping use element");
            continue;
        }

        cx.state.set_visited(candidate, true);
        query(cx, target, ref_scope);
        if let Err(err) = clone_use(cx, candidate, target) {
            warn!(use_node:? = candidate, target:?, err:err; "Failed to clone use element");
            cx.state.set_visited(candidate, false);
        }
    }
}

/// Finds the target of `use_node` inside `ref_scope`.
///
/// A `use` element as `ref_scope` is its own resolution.
fn resolve(cx: &Context<'_>, use_node: NodeId, ref_scope: NodeId) -> Option<NodeId> {
    if cx.doc.is_element_named(ref_scope, vocab::USE) {
        return Some(ref_scope);
    }

    let Some(id) = reference_address(cx, use_node) else {
        debug!(use_node:?; "Use element has no local reference");
        return None;
    };
    match cx.select_first(ref_scope, &format!("{} #{id}", vocab::SVG)) {
        Ok(Some(target)) => {
            debug!(use_node:?, target:?, id; "Resolved use element");
            Some(target)
        }
        Ok(None) => {
            debug!(use_node:?, id; "Reference not found yet");
            None
        }
        Err(err) => {
            debug!(use_node:?, id, err:err; "Unusable reference");
            None
        }
    }
}

/// Returns the fragment id `use_node` points at.
///
/// Only same-document references (`#id`) are supported; `href` takes
/// precedence over `xlink:href`.
fn reference_address<'a>(cx: &'a Context<'_>, use_node: NodeId) -> Option<&'a str> {
    let address = cx
        .doc
        .attribute(use_node, vocab::HREF)
        .or_else(|| cx.doc.attribute(use_node, vocab::XLINK_HREF))?;
    fragment_id(address)
}

fn fragment_id(address: &str) -> Option<&str> {
    let id = address.trim().strip_prefix('#')?;
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}
