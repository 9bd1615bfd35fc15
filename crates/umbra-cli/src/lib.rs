//! Umbra CLI library
//!
//! This module contains the core CLI logic: read an SVG file, expand every
//! `use` element into a synchronized clone, and write the result.

pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::Args;
pub use error::CliError;

use std::fs;

use log::{debug, info};

use umbra::Engine;
use umbra_core::dom::{Document, NodeId};
use umbra_parser::{SelectorQuery, parse_document, write_document};

/// Run the Umbra CLI application
///
/// This function expands the input file with the Umbra engine and writes
/// the expanded SVG to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed input markup
/// - Root selectors that match nothing
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Expanding SVG"
    );

    let config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let mut doc = parse_document(&source)?;

    let use_root = find_root(&doc, args.use_root.as_deref())?;
    let ref_root = find_root(&doc, args.ref_root.as_deref())?;

    let mut engine = Engine::new(config, &mut doc);
    engine.main(&mut doc, use_root, ref_root);
    let rounds = engine.flush(&mut doc);
    debug!(rounds; "Change batches delivered");

    fs::write(&args.output, write_document(&doc))?;

    info!(output_file = args.output; "Expanded SVG written");

    Ok(())
}

/// Resolves an optional root selector against the document node.
fn find_root(doc: &Document, selector: Option<&str>) -> Result<Option<NodeId>, CliError> {
    let Some(selector) = selector else {
        return Ok(None);
    };
    doc.query_selector(doc.root(), selector)
        .map_err(CliError::Selector)?
        .map(Some)
        .ok_or_else(|| CliError::RootNotFound(selector.to_string()))
}
