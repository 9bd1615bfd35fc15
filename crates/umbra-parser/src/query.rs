//! String-level subtree queries.
//!
//! [`SelectorQuery`] is the generic query surface of a tree: give it a scope
//! node and a selector string, get back matching descendants in document
//! order. [`Document`] implements it by parsing the selector and evaluating it
//! with [`Document::select_all`]. Wrappers (such as a filter that hides some
//! nodes) implement it by rewriting the selector string and delegating.

use umbra_core::dom::{Document, NodeId};

use crate::{error::ParseError, selector::parse_selector};

/// Selector-based queries over a subtree.
pub trait SelectorQuery {
    /// Returns the first descendant of `scope` matching `selectors`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Selector`] if `selectors` does not parse.
    fn query_selector(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, ParseError>;

    /// Returns every descendant of `scope` matching `selectors`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Selector`] if `selectors` does not parse.
    fn query_selector_all(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, ParseError>;
}

impl SelectorQuery for Document {
    fn query_selector(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, ParseError> {
        let list = parse_selector(selectors)?;
        Ok(self.select_first(scope, &list))
    }

    fn query_selector_all(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        let list = parse_selector(selectors)?;
        Ok(self.select_all(scope, &list))
    }
}
