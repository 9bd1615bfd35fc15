//! Bidirectional links between reference nodes and their clones.
//!
//! [`link`] walks a reference subtree and its clone side by side, recording
//! each pair in the side table and tagging both nodes with their role marker.
//! [`unlink`] undoes exactly what `link` did, following the back-references
//! stored on the clone side so it works even after the reference subtree has
//! changed shape.
//!
//! Shape mismatches never abort a walk: pairs up to the shorter child list
//! are still processed and the first mismatch found is returned once the
//! walk finishes.

use log::{trace, warn};

use umbra_core::{dom::NodeId, name::Name};

use crate::{context::Context, error::UmbraError};

/// Links `clone` to `reference`, recursing pairwise over their children.
pub(crate) fn link(
    cx: &mut Context<'_>,
    reference: NodeId,
    clone: NodeId,
) -> Result<(), UmbraError> {
    let mut violation = None;
    link_pair(cx, reference, clone, &mut violation)?;
    violation.map_or(Ok(()), Err)
}

fn link_pair(
    cx: &mut Context<'_>,
    reference: NodeId,
    clone: NodeId,
    violation: &mut Option<UmbraError>,
) -> Result<(), UmbraError> {
    trace!(reference:?, clone:?; "Link");
    cx.state.add_clone(reference, clone);
    if cx.doc.element(reference).is_some() {
        let marker = Name::new(cx.reference_marker());
        cx.doc.set_attribute(reference, marker, "true")?;
    }
    if cx.doc.element(clone).is_some() {
        let marker = Name::new(cx.clone_marker());
        cx.doc.set_attribute(clone, marker, "true")?;
    }

    let reference_children = cx.doc.children(reference).to_vec();
    let clone_children = cx.doc.children(clone).to_vec();
    if reference_children.len() != clone_children.len() && violation.is_none() {
        *violation = Some(UmbraError::ParityViolation {
            reference,
            clone,
            reference_children: reference_children.len(),
            clone_children: clone_children.len(),
        });
    }

    for (reference_child, clone_child) in reference_children.into_iter().zip(clone_children) {
        link_pair(cx, reference_child, clone_child, violation)?;
    }
    Ok(())
}

/// Removes the link between `reference` and `clone` and, recursively,
/// between every clone descendant and the node it mirrors.
///
/// Markers are left in place: a reference node may still have other clones,
/// and a detached clone is never queried again.
pub(crate) fn unlink(
    cx: &mut Context<'_>,
    reference: NodeId,
    clone: NodeId,
) -> Result<(), UmbraError> {
    let mut violation = None;
    unlink_pair(cx, reference, clone, &mut violation);
    violation.map_or(Ok(()), Err)
}

fn unlink_pair(
    cx: &mut Context<'_>,
    reference: NodeId,
    clone: NodeId,
    violation: &mut Option<UmbraError>,
) {
    trace!(reference:?, clone:?; "Unlink");
    cx.state.remove_clone(reference, clone);

    for clone_child in cx.doc.children(clone).to_vec() {
        match cx.state.back_ref(clone_child) {
            Some(reference_child) => unlink_pair(cx, reference_child, clone_child, violation),
            None => {
                violation.get_or_insert(UmbraError::MissingBackReference(clone_child));
            }
        }
    }
}

/// Logs a correspondence violation and swallows it; any other error is
/// passed through.
pub(crate) fn tolerate_parity(result: Result<(), UmbraError>) -> Result<(), UmbraError> {
    match result {
        Err(err) if err.is_parity_violation() => {
            warn!(err:err; "Clone tree out of step with its reference");
            Ok(())
        }
        other => other,
    }
}
