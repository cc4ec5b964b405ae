//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use clap::Parser;
use std::io;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;
use vcxgraph::{cli::Cli, runner};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::ERROR
    };
    fmt().with_max_level(max_level).with_writer(io::stderr).init();
    let mut stdout = io::stdout().lock();
    match runner::run(&cli, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", runner::render_error(&err));
            ExitCode::FAILURE
        }
    }
}
