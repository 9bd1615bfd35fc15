//! Arena-backed document tree.
//!
//! A [`Document`] owns every node it creates. Nodes are addressed by
//! [`NodeId`] handles that stay valid after a node is detached from the tree:
//! detached nodes simply have no parent and can be re-inserted later. A
//! handle only goes stale once its subtree is explicitly discarded with
//! [`Document::discard`]; the freed slots are then reused with a new
//! generation, so a stale handle never aliases a newer node.
//!
//! Every structural or attribute mutation performed through the document is
//! reported to the change-notification registry (see [`crate::observer`]).
//! Creating nodes and copying subtrees produce detached nodes and therefore
//! report nothing until the result is inserted.

use std::{collections::HashSet, fmt};

use indexmap::IndexMap;
use log::trace;

use crate::{
    error::DomError,
    name::Name,
    observer::{MutationRecord, ObserverRegistry},
};

/// A generational handle to a node in a [`Document`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns how many times the slot was reused before this node.
    #[inline]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "NodeId({})", self.index),
            generation => write!(f, "NodeId({}v{generation})", self.index),
        }
    }
}

/// An element: a tag name plus its attributes in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: Name,
    attributes: IndexMap<Name, String>,
}

impl Element {
    fn new(name: Name) -> Self {
        Self {
            name,
            attributes: IndexMap::new(),
        }
    }

    /// Returns the tag name.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Returns the value of the attribute `name`, if present.
    pub fn attribute(&self, name: Name) -> Option<&str> {
        self.attributes.get(&name).map(String::as_str)
    }

    /// Iterates attributes in the order they were first set.
    pub fn attributes(&self) -> impl Iterator<Item = (Name, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The document node. Exactly one exists per [`Document`]: its root.
    Document,
    /// An element node.
    Element(Element),
    /// A text node with its decoded character content.
    Text(String),
}

#[derive(Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An arena slot. `node` is `None` while the slot sits on the free list.
#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// A mutable document tree with change notification.
///
/// # Examples
///
/// ```
/// use umbra_core::dom::Document;
///
/// let mut doc = Document::new();
/// let svg = doc.create_element("svg");
/// let rect = doc.create_element("rect");
/// doc.append_child(doc.root(), svg).unwrap();
/// doc.append_child(svg, rect).unwrap();
/// doc.set_attribute(rect, "width", "50").unwrap();
///
/// assert_eq!(doc.parent(rect), Some(svg));
/// assert_eq!(doc.attribute(rect, "width"), Some("50"));
/// ```
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Slot>,
    free: Vec<u32>,
    pub(crate) observers: ObserverRegistry,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only its document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Slot {
                generation: 0,
                node: Some(NodeData::new(NodeKind::Document)),
            }],
            free: Vec::new(),
            observers: ObserverRegistry::default(),
        }
    }

    /// Returns the document node.
    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    /// Returns the number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Returns `true` if the document holds nothing but its document node.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    // -- Creation --

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let node = Some(NodeData::new(kind));
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index as usize];
            slot.node = node;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = u32::try_from(self.nodes.len()).expect("document exceeds u32::MAX nodes");
        self.nodes.push(Slot {
            generation: 0,
            node,
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, name: impl Into<Name>) -> NodeId {
        self.push(NodeKind::Element(Element::new(name.into())))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, content: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(content.into()))
    }

    /// Copies the subtree rooted at `id` into new detached nodes, passing
    /// every element name through `rename`.
    ///
    /// The copy has the same shape as the source: child `j` of a copied node
    /// is the copy of child `j` of its source.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::UnknownNode`] for a foreign handle and
    /// [`DomError::NotAnElement`] when asked to copy the document node.
    pub fn deep_copy_with<F>(&mut self, id: NodeId, rename: &mut F) -> Result<NodeId, DomError>
    where
        F: FnMut(Name) -> Name,
    {
        let kind = match &self.data(id)?.kind {
            NodeKind::Document => return Err(DomError::NotAnElement(id)),
            NodeKind::Element(element) => {
                let mut element = element.clone();
                element.name = rename(element.name);
                NodeKind::Element(element)
            }
            NodeKind::Text(content) => NodeKind::Text(content.clone()),
        };
        let copy = self.push(kind);

        let children = self.data(id)?.children.clone();
        for child in children {
            let child_copy = self.deep_copy_with(child, rename)?;
            self.data_mut(child_copy)?.parent = Some(copy);
            self.data_mut(copy)?.children.push(child_copy);
        }

        Ok(copy)
    }

    /// Frees the detached subtree rooted at `id`, returning how many nodes
    /// were freed.
    ///
    /// Every handle into the subtree goes stale and its slot is reused by
    /// later creations. Observer registrations on freed nodes are dropped.
    /// Records already queued keep their stale handles.
    ///
    /// # Errors
    ///
    /// - [`DomError::UnknownNode`] for a foreign or stale handle.
    /// - [`DomError::Attached`] if `id` still has a parent or is the document
    ///   node.
    pub fn discard(&mut self, id: NodeId) -> Result<usize, DomError> {
        if self.data(id)?.parent.is_some() || id == self.root() {
            return Err(DomError::Attached(id));
        }

        let mut freed = HashSet::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.nodes.get_mut(current.slot()) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
            stack.extend(node.children);
            freed.insert(current);
        }

        self.observers.forget_targets(&freed);
        trace!(node:? = id, freed = freed.len(); "Discarded subtree");
        Ok(freed.len())
    }

    // -- Inspection --

    fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes
            .get(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes
            .get_mut(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.get(id).ok_or(DomError::UnknownNode(id))
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.get_mut(id).ok_or(DomError::UnknownNode(id))
    }

    /// Returns `true` if `id` is a live node of this document.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the kind of node `id`.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|node| &node.kind)
    }

    /// Returns the element data of `id`, or `None` for non-elements.
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the tag name of element `id`.
    pub fn name(&self, id: NodeId) -> Option<Name> {
        self.element(id).map(Element::name)
    }

    /// Returns `true` if `id` is an element with tag `name`.
    pub fn is_element_named(&self, id: NodeId, name: &str) -> bool {
        self.name(id).is_some_and(|tag| tag == name)
    }

    /// Returns the content of text node `id`.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Returns the value of attribute `name` on element `id`.
    pub fn attribute(&self, id: NodeId, name: impl Into<Name>) -> Option<&str> {
        self.element(id)?.attribute(name.into())
    }

    /// Returns `true` if element `id` carries attribute `name`.
    pub fn has_attribute(&self, id: NodeId, name: impl Into<Name>) -> bool {
        self.attribute(id, name).is_some()
    }

    /// Returns the parent of `id`, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Returns the children of `id` in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the sibling immediately after `id`.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let position = siblings.iter().position(|sibling| *sibling == id)?;
        siblings.get(position + 1).copied()
    }

    /// Iterates the ancestors of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Returns `true` if `id` is reachable from the document node.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root(), id)
    }

    /// Returns the nearest ancestor element of `id` with tag `name`.
    pub fn closest_ancestor_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(id)
            .find(|ancestor| self.is_element_named(*ancestor, name))
    }

    /// Iterates the descendants of `id` in document order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = self.children(id).to_vec();
        stack.reverse();
        Descendants { doc: self, stack }
    }

    // -- Attribute mutation --

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match self.get_mut(id) {
            Some(NodeData {
                kind: NodeKind::Element(element),
                ..
            }) => Ok(element),
            Some(_) => Err(DomError::NotAnElement(id)),
            None => Err(DomError::UnknownNode(id)),
        }
    }

    /// Sets attribute `name` on element `id`.
    ///
    /// An attribute record is reported even when the value does not change.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotAnElement`] if `id` is not an element.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<Name>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let name = name.into();
        let value = value.into();
        trace!(node:? = id, name = name.as_string(), value; "Set attribute");
        self.element_mut(id)?.attributes.insert(name, value);
        self.queue_record(MutationRecord::attribute(id, name));
        Ok(())
    }

    /// Removes attribute `name` from element `id`, returning its old value.
    ///
    /// Nothing is reported when the attribute was absent.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotAnElement`] if `id` is not an element.
    pub fn remove_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<Name>,
    ) -> Result<Option<String>, DomError> {
        let name = name.into();
        let removed = self.element_mut(id)?.attributes.shift_remove(&name);
        if removed.is_some() {
            self.queue_record(MutationRecord::attribute(id, name));
        }
        Ok(removed)
    }

    // -- Structural mutation --

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_kind = &self.data(parent)?.kind;
        let child_kind = &self.data(child)?.kind;
        if matches!(parent_kind, NodeKind::Text(_))
            || matches!(child_kind, NodeKind::Document)
            || self.is_inclusive_ancestor(child, parent)
        {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        Ok(())
    }

    /// Unhooks `child` from its current parent, reporting the removal.
    fn detach_quietly(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.get_mut(child)?.parent.take()?;
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|sibling| *sibling != child);
        }
        Some(parent)
    }

    /// Inserts `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None`.
    ///
    /// If `child` is already attached it is moved: a removal is reported on
    /// its old parent before the addition is reported on `parent`.
    ///
    /// # Errors
    ///
    /// - [`DomError::HierarchyRequest`] if `child` is the document node, an
    ///   inclusive ancestor of `parent`, or `parent` is a text node.
    /// - [`DomError::NotAChild`] if `reference` is not a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        if let Some(reference) = reference {
            self.data(reference)?;
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };

        if let Some(old_parent) = self.detach_quietly(child) {
            self.queue_record(MutationRecord::child_list(
                old_parent,
                Vec::new(),
                vec![child],
            ));
        }

        let siblings = &mut self.data_mut(parent)?.children;
        let index = reference
            .and_then(|reference| siblings.iter().position(|sibling| *sibling == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);
        self.data_mut(child)?.parent = Some(parent);

        self.queue_record(MutationRecord::child_list(parent, vec![child], Vec::new()));
        Ok(())
    }

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// See [`Document::insert_before`].
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Removes `child` from `parent`. The node stays alive, detached.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotAChild`] if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.data(parent)?;
        self.data(child)?;
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach_quietly(child);
        self.queue_record(MutationRecord::child_list(parent, Vec::new(), vec![child]));
        Ok(())
    }

    /// Replaces every child of `parent` with `children`, reported as a single
    /// child-list record.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::HierarchyRequest`] if any of `children` cannot be
    /// inserted into `parent`. The tree is left untouched in that case.
    pub fn replace_children(
        &mut self,
        parent: NodeId,
        children: Vec<NodeId>,
    ) -> Result<(), DomError> {
        for child in &children {
            self.check_insertable(parent, *child)?;
        }

        for child in &children {
            if self.parent(*child) == Some(parent) {
                continue;
            }
            if let Some(old_parent) = self.detach_quietly(*child) {
                self.queue_record(MutationRecord::child_list(
                    old_parent,
                    Vec::new(),
                    vec![*child],
                ));
            }
        }

        let removed = std::mem::take(&mut self.data_mut(parent)?.children);
        for old in &removed {
            if let Some(node) = self.get_mut(*old) {
                node.parent = None;
            }
        }
        for child in &children {
            self.data_mut(*child)?.parent = Some(parent);
        }
        self.data_mut(parent)?.children = children.clone();

        if !removed.is_empty() || !children.is_empty() {
            self.queue_record(MutationRecord::child_list(parent, children, removed));
        }
        Ok(())
    }
}

/// Iterator over a node's ancestors. See [`Document::ancestors`].
#[derive(Debug)]
pub struct Ancestors<'doc> {
    doc: &'doc Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over a node's descendants. See
/// [`Document::descendants`].
#[derive(Debug)]
pub struct Descendants<'doc> {
    doc: &'doc Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(current).iter().rev().copied());
        Some(current)
    }
}
