//! SVG markup reading and writing.
//!
//! Reading is driven by the event parser of the [`svg`] crate. Declarations,
//! processing instructions, comments and whitespace-only text are dropped.
//! Attributes arrive unordered from the event parser and are stored sorted by
//! name so that documents read from the same source are identical.
//!
//! Character references in attribute values and text are decoded on the way
//! in, so the [`Document`] always holds plain text. Writing goes back through
//! the [`svg`] crate's node types, which escape markup characters again.

use html_escape::decode_html_entities;
use log::{debug, trace};
use svg::{
    Node,
    node::{
        Text,
        element::{Element, tag::Type},
    },
    parser::Event,
};

use umbra_core::dom::{Document, NodeId, NodeKind};

use crate::error::ParseError;

/// Reads `source` into a new [`Document`].
///
/// # Errors
///
/// Returns a [`ParseError`] for malformed markup, unbalanced tags, or
/// elements left open at the end of input.
///
/// # Examples
///
/// ```
/// let doc = umbra_parser::parse_document(
///     r##"<svg><rect id="a" width="5"/><use href="#a"/></svg>"##,
/// ).unwrap();
///
/// let svg = doc.children(doc.root())[0];
/// assert_eq!(doc.children(svg).len(), 2);
/// ```
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let mut doc = Document::new();
    let mut open: Vec<(NodeId, String)> = Vec::new();

    for event in svg::read(source)? {
        match event {
            Event::Tag(name, kind, attributes) => match kind {
                Type::Start | Type::Empty => {
                    let element = doc.create_element(name);

                    let mut attributes: Vec<_> = attributes.into_iter().collect();
                    attributes.sort_by(|(a, _), (b, _)| a.cmp(b));
                    for (key, value) in attributes {
                        doc.set_attribute(element, key.as_str(), decode_html_entities(&*value))?;
                    }

                    let parent = open.last().map_or(doc.root(), |(id, _)| *id);
                    doc.append_child(parent, element)?;

                    if matches!(kind, Type::Start) {
                        open.push((element, name.to_string()));
                    }
                }
                Type::End => match open.pop() {
                    Some((_, expected)) if expected == name => {}
                    Some((_, expected)) => {
                        return Err(ParseError::MismatchedTag {
                            expected,
                            found: name.to_string(),
                        });
                    }
                    None => return Err(ParseError::UnexpectedClose(name.to_string())),
                },
            },
            Event::Text(content) => {
                if content.trim().is_empty() {
                    continue;
                }
                let parent = open.last().map_or(doc.root(), |(id, _)| *id);
                let text = doc.create_text(decode_html_entities(content));
                doc.append_child(parent, text)?;
            }
            Event::Error(err) => return Err(ParseError::Markup(err.to_string())),
            _ => trace!("Skipping non-content markup event"),
        }
    }

    if let Some((_, name)) = open.pop() {
        return Err(ParseError::Unclosed(name));
    }

    debug!(nodes = doc.len(); "Markup parsed");
    Ok(doc)
}

/// Serializes every child of the document node.
pub fn write_document(doc: &Document) -> String {
    doc.children(doc.root())
        .iter()
        .filter_map(|child| to_svg_node(doc, *child))
        .map(|node| node.to_string())
        .collect()
}

/// Serializes the subtree rooted at `id`, including `id` itself.
pub fn write_node(doc: &Document, id: NodeId) -> String {
    match doc.kind(id) {
        Some(NodeKind::Document) => write_document(doc),
        _ => to_svg_node(doc, id)
            .map(|node| node.to_string())
            .unwrap_or_default(),
    }
}

/// Builds the [`svg`] node tree for the subtree at `id`.
fn to_svg_node(doc: &Document, id: NodeId) -> Option<Box<dyn Node>> {
    match doc.kind(id)? {
        NodeKind::Element(element) => {
            let mut node = Element::new(element.name().as_string());
            for (name, value) in element.attributes() {
                node.assign(name.as_string(), value);
            }
            let children = node.get_children_mut();
            children.extend(
                doc.children(id)
                    .iter()
                    .filter_map(|child| to_svg_node(doc, *child)),
            );
            Some(Box::new(node))
        }
        NodeKind::Text(content) => Some(Box::new(Text::new(content.as_str()))),
        NodeKind::Document => None,
    }
}
