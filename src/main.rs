//! # shiplog CLI
//!
//! This is the binary entry point for the `shiplog` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Executing the appropriate command based on the parsed arguments.
//! - Translating errors into a message on stderr and a process exit code.
//!
//! The core application logic lives in the `shiplog` library crate; the
//! binary is a thin wrapper around it.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(exit_code(&error))
        }
    }
}

/// Exit status for an error. Library errors decide their own code (external
/// tools pass their status through); anything else exits with 1.
fn exit_code(error: &anyhow::Error) -> u8 {
    let code = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<shiplog::error::Error>())
        .map(shiplog::error::Error::exit_code)
        .unwrap_or(1);
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}
