//! Selector syntax tree and matching.
//!
//! This is the subset of CSS selectors needed to address SVG content:
//!
//! - type selectors (`use`) and the universal selector (`*`)
//! - `#id`, `.class`, `[attr]` and `[attr=value]`
//! - `:not(...)` over a compound selector
//! - descendant (` `) and child (`>`) combinators
//! - comma-separated selector lists
//!
//! Parsing lives in `umbra-parser`; this module only defines the tree and
//! evaluates it against a [`Document`].

use crate::{
    dom::{Document, NodeId},
    name::Name,
};

/// A single condition inside a compound selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `#value`: the `id` attribute equals the value.
    Id(String),
    /// `.value`: the whitespace-separated `class` attribute contains the value.
    Class(String),
    /// `[name]` or `[name=value]`.
    Attribute { name: Name, value: Option<String> },
    /// `:not(compound)`.
    Not(Box<CompoundSelector>),
}

/// A sequence of conditions on one element, e.g. `use#a:not([cpy])`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompoundSelector {
    /// Required tag name; `None` matches any element.
    pub element: Option<Name>,
    /// Additional conditions, all of which must hold.
    pub conditions: Vec<Condition>,
}

impl CompoundSelector {
    /// Returns `true` if element `id` satisfies every part of this compound.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        let Some(element) = doc.element(id) else {
            return false;
        };
        if self.element.is_some_and(|name| name != element.name()) {
            return false;
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(value) => element.attribute(Name::new("id")) == Some(value.as_str()),
            Condition::Class(value) => element
                .attribute(Name::new("class"))
                .is_some_and(|classes| classes.split_whitespace().any(|class| class == value)),
            Condition::Attribute { name, value } => match (element.attribute(*name), value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            },
            Condition::Not(inner) => !inner.matches(doc, id),
        })
    }
}

/// How two compound selectors relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any ancestor.
    Descendant,
    /// `>`: the direct parent.
    Child,
}

/// Compound selectors joined by combinators, e.g. `svg > g use`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    compounds: Vec<CompoundSelector>,
    combinators: Vec<Combinator>,
}

impl ComplexSelector {
    /// Starts a complex selector from its leftmost compound.
    pub fn new(first: CompoundSelector) -> Self {
        Self {
            compounds: vec![first],
            combinators: Vec::new(),
        }
    }

    /// Appends `compound`, related to the previous one by `combinator`.
    pub fn then(mut self, combinator: Combinator, compound: CompoundSelector) -> Self {
        self.combinators.push(combinator);
        self.compounds.push(compound);
        self
    }

    /// The compound selectors, leftmost first.
    pub fn compounds(&self) -> &[CompoundSelector] {
        &self.compounds
    }

    /// Returns `true` if element `id` matches, evaluated in the context of
    /// the whole document.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.matches_at(doc, id, self.compounds.len() - 1)
    }

    fn matches_at(&self, doc: &Document, id: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, id) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent(id)
                .is_some_and(|parent| self.matches_at(doc, parent, index - 1)),
            Combinator::Descendant => doc
                .ancestors(id)
                .any(|ancestor| self.matches_at(doc, ancestor, index - 1)),
        }
    }
}

/// A comma-separated list of complex selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList(pub Vec<ComplexSelector>);

impl SelectorList {
    /// Returns `true` if element `id` matches any selector in the list.
    pub fn matches(&self, doc: &Document, id: NodeId) -> bool {
        self.0.iter().any(|selector| selector.matches(doc, id))
    }
}

impl Document {
    /// Returns every descendant of `scope` matching `selectors`, in document
    /// order. `scope` itself is never returned, but ancestors outside
    /// `scope` take part in matching.
    pub fn select_all(&self, scope: NodeId, selectors: &SelectorList) -> Vec<NodeId> {
        self.descendants(scope)
            .filter(|id| selectors.matches(self, *id))
            .collect()
    }

    /// Returns the first descendant of `scope` matching `selectors`.
    pub fn select_first(&self, scope: NodeId, selectors: &SelectorList) -> Option<NodeId> {
        self.descendants(scope)
            .find(|id| selectors.matches(self, *id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(element: Option<&str>, conditions: Vec<Condition>) -> CompoundSelector {
        CompoundSelector {
            element: element.map(Name::new),
            conditions,
        }
    }

    /// `<svg><defs><rect id="a" class="big red"/></defs><use href="#a"/></svg>`
    fn sample() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let svg = doc.create_element("svg");
        let defs = doc.create_element("defs");
        let rect = doc.create_element("rect");
        let use_node = doc.create_element("use");
        doc.append_child(doc.root(), svg).unwrap();
        doc.append_child(svg, defs).unwrap();
        doc.append_child(defs, rect).unwrap();
        doc.append_child(svg, use_node).unwrap();
        doc.set_attribute(rect, "id", "a").unwrap();
        doc.set_attribute(rect, "class", "big red").unwrap();
        doc.set_attribute(use_node, "href", "#a").unwrap();
        (doc, svg, defs, rect, use_node)
    }

    #[test]
    fn test_descendant_combinator() {
        let (doc, _, _, rect, _) = sample();
        let selector = ComplexSelector::new(compound(Some("svg"), vec![]))
            .then(Combinator::Descendant, compound(None, vec![Condition::Id("a".into())]));
        let list = SelectorList(vec![selector]);

        assert_eq!(doc.select_all(doc.root(), &list), vec![rect]);
    }

    #[test]
    fn test_child_combinator() {
        let (doc, _, _, _, use_node) = sample();
        let direct = ComplexSelector::new(compound(Some("svg"), vec![]))
            .then(Combinator::Child, compound(None, vec![]));
        let list = SelectorList(vec![direct]);

        let found = doc.select_all(doc.root(), &list);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&use_node));
    }

    #[test]
    fn test_not_attribute() {
        let (doc, _, _, _, use_node) = sample();
        let hidden = SelectorList(vec![ComplexSelector::new(compound(
            Some("use"),
            vec![Condition::Not(Box::new(compound(
                None,
                vec![Condition::Attribute {
                    name: Name::new("visibility"),
                    value: None,
                }],
            )))],
        ))]);

        assert_eq!(doc.select_first(doc.root(), &hidden), Some(use_node));
    }

    #[test]
    fn test_class_and_attribute_value() {
        let (doc, _, _, rect, use_node) = sample();
        let class = SelectorList(vec![ComplexSelector::new(compound(
            None,
            vec![Condition::Class("red".into())],
        ))]);
        let href = SelectorList(vec![ComplexSelector::new(compound(
            None,
            vec![Condition::Attribute {
                name: Name::new("href"),
                value: Some("#a".into()),
            }],
        ))]);

        assert_eq!(doc.select_all(doc.root(), &class), vec![rect]);
        assert_eq!(doc.select_all(doc.root(), &href), vec![use_node]);
    }

    #[test]
    fn test_scope_excluded_but_ancestors_considered() {
        let (doc, svg, defs, rect, _) = sample();
        let list = SelectorList(vec![
            ComplexSelector::new(compound(Some("svg"), vec![]))
                .then(Combinator::Descendant, compound(Some("rect"), vec![])),
        ]);

        assert_eq!(doc.select_all(defs, &list), vec![rect]);
        let svgs = SelectorList(vec![ComplexSelector::new(compound(Some("svg"), vec![]))]);
        assert!(!doc.select_all(svg, &svgs).contains(&svg));
    }
}
