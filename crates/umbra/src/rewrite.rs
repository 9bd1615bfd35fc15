//! Structural rewrites applied while copying a reference subtree.
//!
//! A clone subtree must never contain a live `use` element, and a `symbol`
//! has to become something that renders. Copies are therefore made with an
//! explicit rename pass instead of a plain deep copy.

use umbra_core::{
    DomError,
    dom::{Document, NodeId},
    name::Name,
};

use crate::vocab;

/// Which element renames apply to a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    /// `use` becomes `g` and `symbol` becomes `svg`. Used for new clone
    /// subtrees.
    Full,
    /// Only `use` becomes `g`. Used when regenerating the children of a
    /// clone whose container already exists.
    ReferencesOnly,
}

impl Rewrite {
    /// Maps an element name to its name inside a clone subtree.
    ///
    /// ```
    /// use umbra::Rewrite;
    /// use umbra_core::name::Name;
    ///
    /// assert_eq!(Rewrite::Full.rename(Name::new("symbol")), Name::new("svg"));
    /// assert_eq!(Rewrite::ReferencesOnly.rename(Name::new("symbol")), Name::new("symbol"));
    /// assert_eq!(Rewrite::ReferencesOnly.rename(Name::new("use")), Name::new("g"));
    /// ```
    pub fn rename(self, name: Name) -> Name {
        if name == vocab::USE {
            Name::new(vocab::GROUP)
        } else if self == Self::Full && name == vocab::SYMBOL {
            Name::new(vocab::SVG)
        } else {
            name
        }
    }
}

/// Copies the subtree at `source` into a detached clone subtree.
pub(crate) fn rewrite_copy(
    doc: &mut Document,
    source: NodeId,
    rewrite: Rewrite,
) -> Result<NodeId, DomError> {
    doc.deep_copy_with(source, &mut |name| rewrite.rename(name))
}

/// Copies each child of `source` in order, returning the detached copies.
pub(crate) fn rewrite_children(
    doc: &mut Document,
    source: NodeId,
    rewrite: Rewrite,
) -> Result<Vec<NodeId>, DomError> {
    let children = doc.children(source).to_vec();
    children
        .into_iter()
        .map(|child| rewrite_copy(doc, child, rewrite))
        .collect()
}
