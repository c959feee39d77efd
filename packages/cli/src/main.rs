#![allow(clippy::multiple_crate_versions)]

//! Spacegrid CLI - inspect the space engine and run command scripts.
//!
//! The CLI starts a private engine from the configuration file, so it never
//! touches a host's running engine.

mod commands;
mod error;
mod output;
mod script;

use clap::Parser;
use commands::Cli;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "SPACEGRID_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(err) = cli.execute() {
        eprintln!("spacegrid: {err}");
        std::process::exit(1);
    }
}
