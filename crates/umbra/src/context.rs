//! Mutable state threaded through every engine step.

use umbra_core::{
    dom::{Document, NodeId},
    observer::ObserverId,
};
use umbra_parser::SelectorQuery;

use crate::{config::EngineConfig, error::UmbraError, filter::CloneFilter, state::SideTable};

/// The engine's three observer handles, in creation (and delivery) order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Observers {
    /// Reference nodes and cloned `use` elements.
    pub(crate) sync: ObserverId,
    /// Owning `svg` containers of cloned `use` elements.
    pub(crate) moves: ObserverId,
    /// The traversal root passed to [`crate::Engine::main`].
    pub(crate) root: ObserverId,
}

impl Observers {
    pub(crate) fn in_delivery_order(self) -> [ObserverId; 3] {
        [self.sync, self.moves, self.root]
    }
}

/// Borrowed view of the document and the engine state for one operation.
pub(crate) struct Context<'a> {
    pub(crate) doc: &'a mut Document,
    pub(crate) state: &'a mut SideTable,
    pub(crate) config: &'a EngineConfig,
    pub(crate) observers: Observers,
}

impl Context<'_> {
    pub(crate) fn clone_marker(&self) -> &str {
        self.config.markers().clone_marker()
    }

    pub(crate) fn reference_marker(&self) -> &str {
        self.config.markers().reference_marker()
    }

    fn filter(&self) -> CloneFilter<'_, Document> {
        CloneFilter::new(&*self.doc, self.clone_marker())
    }

    /// Filtered `query_selector_all` scoped at `scope`.
    pub(crate) fn select_all(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, UmbraError> {
        Ok(self.filter().query_selector_all(scope, selectors)?)
    }

    /// Filtered `query_selector` scoped at `scope`.
    pub(crate) fn select_first(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, UmbraError> {
        Ok(self.filter().query_selector(scope, selectors)?)
    }
}
