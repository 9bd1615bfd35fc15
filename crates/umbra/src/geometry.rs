//! Placement and sizing of clone subtrees.
//!
//! A `use` element positions its content with `x` and `y` and may override
//! the target's `width` and `height`. Clones cannot reinterpret those
//! attributes, so they are translated onto the clone subtree:
//!
//! - `x`, `y` and `transform` become a single `transform` on the use-copy:
//!   the element's own transform followed by `translate(x,y)`.
//! - `width` and `height` are set on the ref-copy: the element's value if it
//!   has one, else the copy source's, else `100%`.

use log::debug;

use umbra_core::{dom::NodeId, name::Name};

use crate::{context::Context, error::UmbraError, vocab};

const FULL_SIZE: &str = "100%";

/// A `use` attribute that affects clone geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKey {
    X,
    Y,
    Transform,
    Width,
    Height,
}

impl GeometryKey {
    /// Every geometry key, in resolution order.
    pub const ALL: [GeometryKey; 5] = [
        GeometryKey::X,
        GeometryKey::Y,
        GeometryKey::Transform,
        GeometryKey::Width,
        GeometryKey::Height,
    ];

    /// Maps an attribute name to its key. Other attributes have no key.
    ///
    /// ```
    /// use umbra::GeometryKey;
    ///
    /// assert_eq!(GeometryKey::from_attribute("x"), Some(GeometryKey::X));
    /// assert_eq!(GeometryKey::from_attribute("stroke-width"), None);
    /// ```
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            vocab::X => Some(Self::X),
            vocab::Y => Some(Self::Y),
            vocab::TRANSFORM => Some(Self::Transform),
            vocab::WIDTH => Some(Self::Width),
            vocab::HEIGHT => Some(Self::Height),
            _ => None,
        }
    }

    fn is_positional(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Transform)
    }
}

/// Reads a coordinate attribute value as a number.
///
/// Absent, empty, unparsable and non-finite values all read as `0`.
pub fn coerce_number(value: Option<&str>) -> f64 {
    let number = value
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|number| number.is_finite())
        .unwrap_or(0.0);
    // Normalizes -0 so it never prints as "-0".
    if number == 0.0 { 0.0 } else { number }
}

/// Builds the use-copy transform from a `use` element's attributes.
///
/// ```
/// use umbra::geometry::position_transform;
///
/// assert_eq!(position_transform(None, Some("10"), Some("5")), "translate(10,5)");
/// assert_eq!(
///     position_transform(Some("scale(2)"), None, Some("1.5")),
///     "scale(2) translate(0,1.5)"
/// );
/// ```
pub fn position_transform(transform: Option<&str>, x: Option<&str>, y: Option<&str>) -> String {
    let translate = format!("translate({},{})", coerce_number(x), coerce_number(y));
    match transform.map(str::trim).filter(|transform| !transform.is_empty()) {
        Some(transform) => format!("{transform} {translate}"),
        None => translate,
    }
}

/// Picks the ref-copy size from the `use` element and the copy source.
pub fn resolve_size<'a>(own: Option<&'a str>, source: Option<&'a str>) -> &'a str {
    own.filter(|value| !value.is_empty())
        .or(source.filter(|value| !value.is_empty()))
        .unwrap_or(FULL_SIZE)
}

/// Applies geometry for `key` (or every key when `None`) to the clone
/// subtree of `use_node`.
pub(crate) fn xywh(
    cx: &mut Context<'_>,
    use_node: NodeId,
    key: Option<GeometryKey>,
) -> Result<(), UmbraError> {
    let Some(record) = cx.state.use_record(use_node) else {
        debug!(use_node:?; "No clone to place yet");
        return Ok(());
    };

    if key.is_none_or(GeometryKey::is_positional) {
        let transform = position_transform(
            cx.doc.attribute(use_node, vocab::TRANSFORM),
            cx.doc.attribute(use_node, vocab::X),
            cx.doc.attribute(use_node, vocab::Y),
        );
        cx.doc
            .set_attribute(record.use_copy, vocab::TRANSFORM, transform)?;
    }

    for (size_key, attribute) in [
        (GeometryKey::Width, vocab::WIDTH),
        (GeometryKey::Height, vocab::HEIGHT),
    ] {
        if key.is_some_and(|key| key != size_key) {
            continue;
        }
        let size = resolve_size(
            cx.doc.attribute(use_node, attribute),
            cx.doc.attribute(record.source, attribute),
        )
        .to_string();
        cx.doc
            .set_attribute(record.ref_copy, Name::new(attribute), size)?;
    }

    Ok(())
}
