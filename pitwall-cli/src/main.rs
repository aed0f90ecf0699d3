//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = pitwall_cli::init_logging() {
        eprintln!("pitwall: {err}");
    }
    match pitwall_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(pitwall_cli::CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("pitwall: {err}");
            ExitCode::FAILURE
        }
    }
}
