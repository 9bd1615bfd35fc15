//! Umbra - Live reference-clone synchronization for SVG `use` elements.
//!
//! Umbra expands every `<use href="#id">` element of a [`Document`] into a
//! real clone of the subtree it references and keeps that clone in step with
//! its reference afterwards. Each clone is a `g` element (the use-copy)
//! inserted right before the hidden `use` element; its last child (the
//! ref-copy) mirrors the referenced content.
//!
//! The engine is driven by the document's change notifications:
//!
//! 1. [`Engine::main`] resolves and clones everything reachable from the use
//!    root and starts watching it.
//! 2. The embedder mutates the document freely.
//! 3. [`Engine::flush`] delivers the queued change batches: structural
//!    changes regenerate clones, attribute changes are copied, moved `use`
//!    elements take their clones along, and new `use` elements get cloned.
//!
//! Clone nodes carry a marker attribute so that queries made through
//! [`Engine::query_filter`] never see them.
//!
//! # Example
//!
//! ```
//! use umbra::{Engine, config::EngineConfig};
//! use umbra_parser::{SelectorQuery, parse_document, write_document};
//!
//! let mut doc = parse_document(
//!     r##"<svg><defs><rect id="r" width="5"/></defs><use href="#r" x="1"/></svg>"##,
//! )
//! .unwrap();
//!
//! let mut engine = Engine::new(EngineConfig::default(), &mut doc);
//! engine.main(&mut doc, None, None);
//! engine.flush(&mut doc);
//!
//! assert!(write_document(&doc).contains(r#"transform="translate(1,0)""#));
//! assert_eq!(doc.query_selector_all(doc.root(), "rect").unwrap().len(), 2);
//! let visible = engine.query_filter(&doc).query_selector_all(doc.root(), "rect");
//! assert_eq!(visible.unwrap().len(), 1);
//! ```

pub mod config;
pub mod filter;
pub mod geometry;

mod cloner;
mod context;
mod dispatch;
mod error;
mod linker;
mod rewrite;
mod state;
mod traverse;
mod vocab;

pub use error::UmbraError;
pub use filter::{CloneFilter, exclude_clones};
pub use geometry::GeometryKey;
pub use rewrite::Rewrite;
pub use state::{NodeState, UseRecord};

use log::{debug, info, warn};

use umbra_core::{
    dom::{Document, NodeId},
    observer::ObserveOptions,
};

use config::EngineConfig;
use context::{Context, Observers};
use state::SideTable;

/// The synchronization engine for one [`Document`].
///
/// The engine owns all bookkeeping about clones; the document only carries
/// the clone subtrees themselves and the marker attributes. An engine must
/// always be used with the document it was created for.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    state: SideTable,
    observers: Observers,
    roots: Option<(NodeId, NodeId)>,
}

impl Engine {
    /// Creates an engine and registers its observers with `doc`.
    ///
    /// Nothing is observed until [`Engine::main`] runs.
    pub fn new(config: EngineConfig, doc: &mut Document) -> Self {
        let observers = Observers {
            sync: doc.create_observer(),
            moves: doc.create_observer(),
            root: doc.create_observer(),
        };
        Self {
            config,
            state: SideTable::default(),
            observers,
            roots: None,
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn context<'a>(&'a mut self, doc: &'a mut Document) -> Context<'a> {
        Context {
            doc,
            state: &mut self.state,
            config: &self.config,
            observers: self.observers,
        }
    }

    /// Clones every `use` element under `use_root`, resolving references
    /// inside `ref_root`, and watches `use_root` for new content.
    ///
    /// Both roots default to the document node. Calling `main` again replaces
    /// both roots: the previous use root stops being watched, so edits under
    /// it no longer start a traversal.
    pub fn main(
        &mut self,
        doc: &mut Document,
        use_root: Option<NodeId>,
        ref_root: Option<NodeId>,
    ) {
        let use_root = use_root.unwrap_or_else(|| doc.root());
        let ref_root = ref_root.unwrap_or_else(|| doc.root());
        if !doc.contains(use_root) || !doc.contains(ref_root) {
            warn!(use_root:?, ref_root:?; "Roots do not belong to this document");
            return;
        }

        info!(use_root:?, ref_root:?; "Expanding use elements");
        match self.roots {
            Some((previous, _)) if previous != use_root => {
                debug!(previous:?; "Releasing previous use root");
                doc.unobserve(self.observers.root, previous);
            }
            _ => {}
        }
        doc.observe(
            self.observers.root,
            use_root,
            ObserveOptions::child_list().with_subtree(),
        );
        self.roots = Some((use_root, ref_root));

        let mut cx = self.context(doc);
        traverse::query(&mut cx, use_root, ref_root);
    }

    /// Delivers pending change batches until none are left, returning the
    /// number of delivery rounds.
    ///
    /// Each round hands the sync, move and root batches to their handlers in
    /// that order. Handling may queue new records, which the next round
    /// picks up. After [`DispatchConfig::max_flush_rounds`] rounds the
    /// remaining records stay queued for the next call.
    ///
    /// [`DispatchConfig::max_flush_rounds`]: config::DispatchConfig::max_flush_rounds
    pub fn flush(&mut self, doc: &mut Document) -> usize {
        let max_rounds = self.config.dispatch().max_flush_rounds();
        let observers = self.observers;
        let roots = self.roots;

        let mut rounds = 0;
        while observers
            .in_delivery_order()
            .iter()
            .any(|observer| doc.has_records(*observer))
        {
            if rounds == max_rounds {
                warn!(rounds; "Change batches still pending after flush limit");
                break;
            }
            rounds += 1;
            debug!(round = rounds; "Delivering change batches");

            let mut cx = self.context(doc);
            let records = cx.doc.take_records(observers.sync);
            dispatch::sync(&mut cx, records);
            let records = cx.doc.take_records(observers.moves);
            dispatch::relocate(&mut cx, records);
            let records = cx.doc.take_records(observers.root);
            if let Some((use_root, ref_root)) = roots {
                dispatch::requery(&mut cx, records, use_root, ref_root);
            }
        }

        rounds
    }

    /// Returns the bookkeeping for `node`, if the engine has any.
    pub fn node_state(&self, node: NodeId) -> Option<&NodeState> {
        self.state.state(node)
    }

    /// Returns the number of nodes the engine keeps bookkeeping for.
    pub fn tracked_nodes(&self) -> usize {
        self.state.len()
    }

    /// Returns `true` if `node` is a `use` element that has been resolved.
    pub fn is_visited(&self, node: NodeId) -> bool {
        self.state.is_visited(node)
    }

    /// Returns the clones of `node`, in the order they were linked.
    pub fn clones_of(&self, node: NodeId) -> Vec<NodeId> {
        self.state.clones(node)
    }

    /// Returns the reference node that `clone` mirrors.
    pub fn reference_of(&self, clone: NodeId) -> Option<NodeId> {
        self.state.back_ref(clone)
    }

    /// Returns the clone subtree built for `use_node`.
    pub fn use_record(&self, use_node: NodeId) -> Option<UseRecord> {
        self.state.use_record(use_node)
    }

    /// Returns the use-copy of `use_node`.
    pub fn use_copy(&self, use_node: NodeId) -> Option<NodeId> {
        self.use_record(use_node).map(|record| record.use_copy)
    }

    /// Returns the ref-copy of `use_node`.
    pub fn ref_copy(&self, use_node: NodeId) -> Option<NodeId> {
        self.use_record(use_node).map(|record| record.ref_copy)
    }

    /// Returns a query surface over `doc` that hides clone nodes.
    pub fn query_filter<'a>(&'a self, doc: &'a Document) -> CloneFilter<'a, Document> {
        CloneFilter::new(doc, self.config.markers().clone_marker())
    }
}
