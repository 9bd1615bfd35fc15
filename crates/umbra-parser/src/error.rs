//! Error type for markup and selector parsing.

use std::io;

use thiserror::Error;

use umbra_core::DomError;

/// Errors produced while reading markup or selectors.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed markup: {0}")]
    Markup(String),

    #[error("Closing tag </{found}> does not match open tag <{expected}>")]
    MismatchedTag { expected: String, found: String },

    #[error("Closing tag </{0}> has no matching open tag")]
    UnexpectedClose(String),

    #[error("Element <{0}> is never closed")]
    Unclosed(String),

    #[error("Invalid selector `{selector}` at offset {offset}: {message}")]
    Selector {
        selector: String,
        offset: usize,
        message: String,
    },

    #[error("Tree error: {0}")]
    Dom(#[from] DomError),
}
