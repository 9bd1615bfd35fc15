//! Query filter hiding clone nodes.
//!
//! Clone subtrees live in the real tree, so without help every generic
//! subtree query would see them next to the content they mirror (duplicate
//! ids included). [`CloneFilter`] wraps any [`SelectorQuery`] and rewrites
//! each selector string with [`exclude_clones`] before delegating, so callers
//! only ever observe real content and the hidden `use` elements.

use log::trace;

use umbra_core::dom::NodeId;
use umbra_parser::{ParseError, SelectorQuery};

/// Appends `:not([marker])` to every comma-separated selector in `selectors`.
///
/// Commas nested in parentheses, brackets or quotes do not split segments.
/// Whitespace around each segment is preserved and empty segments are left
/// untouched so that invalid input stays invalid.
///
/// # Examples
///
/// ```
/// use umbra::filter::exclude_clones;
///
/// assert_eq!(exclude_clones("svg use", "cpy"), "svg use:not([cpy])");
/// assert_eq!(
///     exclude_clones("rect, g > circle", "cpy"),
///     "rect:not([cpy]), g > circle:not([cpy])"
/// );
/// ```
pub fn exclude_clones(selectors: &str, marker: &str) -> String {
    let suffix = format!(":not([{marker}])");
    let mut out = String::with_capacity(selectors.len() + suffix.len());
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut segment_start = 0;

    for (index, c) in selectors.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                push_segment(&mut out, &selectors[segment_start..index], &suffix);
                out.push(',');
                segment_start = index + 1;
            }
            _ => {}
        }
    }
    push_segment(&mut out, &selectors[segment_start..], &suffix);

    out
}

fn push_segment(out: &mut String, segment: &str, suffix: &str) {
    let body = segment.trim_end();
    out.push_str(body);
    if !body.trim_start().is_empty() {
        out.push_str(suffix);
    }
    out.push_str(&segment[body.len()..]);
}

/// A [`SelectorQuery`] that never returns clone-marked nodes.
///
/// # Examples
///
/// ```
/// use umbra::filter::CloneFilter;
/// use umbra_parser::{SelectorQuery, parse_document};
///
/// let doc = parse_document(r#"<svg><rect id="a"/><rect id="a" cpy="true"/></svg>"#).unwrap();
/// let filter = CloneFilter::new(&doc, "cpy");
///
/// assert_eq!(doc.query_selector_all(doc.root(), "#a").unwrap().len(), 2);
/// assert_eq!(filter.query_selector_all(doc.root(), "#a").unwrap().len(), 1);
/// ```
#[derive(Debug)]
pub struct CloneFilter<'a, Q: ?Sized> {
    inner: &'a Q,
    marker: &'a str,
}

impl<'a, Q: SelectorQuery + ?Sized> CloneFilter<'a, Q> {
    /// Wraps `inner`, excluding nodes carrying the `marker` attribute.
    pub fn new(inner: &'a Q, marker: &'a str) -> Self {
        Self { inner, marker }
    }

    fn rewrite(&self, selectors: &str) -> String {
        let filtered = exclude_clones(selectors, self.marker);
        trace!(selectors, filtered; "Filtered query");
        filtered
    }
}

impl<Q: SelectorQuery + ?Sized> SelectorQuery for CloneFilter<'_, Q> {
    fn query_selector(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Option<NodeId>, ParseError> {
        self.inner.query_selector(scope, &self.rewrite(selectors))
    }

    fn query_selector_all(
        &self,
        scope: NodeId,
        selectors: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        self.inner.query_selector_all(scope, &self.rewrite(selectors))
    }
}
