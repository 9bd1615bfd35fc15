//! Error adapter for converting [`CliError`] to miette diagnostics.
//!
//! This module provides the bridge between the CLI's error type and miette's
//! report formatting. Markup errors carry no source positions, so reports
//! consist of a code, the message chain and, where one helps, a hint.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use umbra_parser::ParseError;

use crate::{CliError, config::ConfigError};

/// Adapter rendering a [`CliError`] through miette.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "umbra::io",
            CliError::Config(_) => "umbra::config",
            CliError::Markup(_) => "umbra::markup",
            CliError::Selector(_) => "umbra::selector",
            CliError::RootNotFound(_) => "umbra::root",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            CliError::Config(ConfigError::MissingFile(_)) => {
                "check the path passed with --config"
            }
            CliError::Config(ConfigError::Parse(_)) => {
                "valid sections are [markers] and [dispatch]"
            }
            CliError::Markup(ParseError::MismatchedTag { .. } | ParseError::Unclosed(_)) => {
                "every start tag needs a matching end tag"
            }
            CliError::RootNotFound(_) => "root selectors are matched against the input document",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_codes() {
        let err = CliError::RootNotFound("#missing".to_string());
        let adapter = ErrorAdapter(&err);

        assert_eq!(adapter.code().unwrap().to_string(), "umbra::root");
        assert_eq!(
            adapter.to_string(),
            "No element matches root selector `#missing`"
        );
    }

    #[test]
    fn test_help_only_where_useful() {
        let missing = CliError::Config(ConfigError::MissingFile(PathBuf::from("x.toml")));
        assert!(ErrorAdapter(&missing).help().is_some());

        let io = CliError::Io(std::io::Error::other("disk"));
        assert!(ErrorAdapter(&io).help().is_none());
    }

    #[test]
    fn test_source_chain_is_kept() {
        let err = CliError::Config(ConfigError::Parse("bad".to_string()));
        let adapter = ErrorAdapter(&err);

        let source = std::error::Error::source(&adapter).unwrap();
        assert_eq!(source.to_string(), "Failed to parse TOML configuration: bad");
    }
}
