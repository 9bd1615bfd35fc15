//! Command-line arguments of the `umbra` binary.
//!
//! The binary reads one SVG document, expands its `use` elements into
//! synchronized clone subtrees and writes the result. Selectors given with
//! `--use-root` and `--ref-root` narrow where `use` elements are looked for
//! and where their references are resolved.

use clap::Parser;

/// Expands SVG `use` elements into real clone subtrees
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// SVG document whose use elements are expanded
    pub input: String,

    /// Where the expanded SVG document is written
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// TOML file with marker names and flush settings
    #[arg(short, long)]
    pub config: Option<String>,

    /// Selector of the element whose use elements are expanded
    #[arg(long)]
    pub use_root: Option<String>,

    /// Selector of the element that references are resolved in
    #[arg(long)]
    pub ref_root: Option<String>,

    /// Verbosity of the expansion log
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
