//! Umbra CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use umbra_cli::{Args, error_adapter::ErrorAdapter};

fn main() {
    miette::set_panic_hook();

    let args = Args::parse();

    let level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Unknown log level `{}`, falling back to warn", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .init();

    info!(level:?; "Starting Umbra");
    debug!(args:?; "Parsed arguments");

    let Err(err) = umbra_cli::run(&args) else {
        info!("Done");
        return;
    };

    let mut report = String::new();
    miette::GraphicalReportHandler::new()
        .render_report(&mut report, &ErrorAdapter(&err))
        .expect("Writing to String buffer is infallible");
    error!("{report}");
    process::exit(1);
}
