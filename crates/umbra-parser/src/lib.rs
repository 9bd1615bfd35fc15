//! Umbra Parser
//!
//! Reading and writing of SVG markup into [`umbra_core::dom::Document`]
//! trees, and the selector grammar behind [`SelectorQuery`].
//!
//! # Example
//!
//! ```
//! use umbra_parser::{SelectorQuery, parse_document, write_document};
//!
//! let doc = parse_document(r##"<svg><rect id="a"/></svg>"##).unwrap();
//! let rect = doc.query_selector(doc.root(), "svg #a").unwrap();
//! assert!(rect.is_some());
//! assert_eq!(write_document(&doc), "<svg>\n<rect id=\"a\"/>\n</svg>");
//! ```

pub mod error;

mod markup;
mod query;
mod selector;

pub use error::ParseError;
pub use markup::{parse_document, write_document, write_node};
pub use query::SelectorQuery;
pub use selector::parse_selector;
