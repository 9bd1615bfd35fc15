//! Error type for the CLI.

use std::io;

use thiserror::Error;

use umbra_parser::ParseError;

use crate::config::ConfigError;

/// Everything that can stop an expansion run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read SVG: {0}")]
    Markup(#[from] ParseError),

    #[error("Invalid root selector: {0}")]
    Selector(#[source] ParseError),

    #[error("No element matches root selector `{0}`")]
    RootNotFound(String),
}
