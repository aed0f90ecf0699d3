//! Command-line interface for Pitwall.
//!
//! Every subcommand layers its options from flags, `PITWALL_*` environment
//! variables and configuration files through `ortho_config`, then drives the
//! library crates and prints JSON to stdout.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use serde::Serialize;

mod error;
mod ingest;
mod logging;
mod query;
mod reset;
mod status;

pub use error::CliError;
pub use logging::init_logging;

use ingest::IngestArgs;
use query::QueryArgs;
use reset::ResetArgs;
use status::StatusArgs;

const ARG_DATABASE: &str = "database";
const ARG_BASE_URL: &str = "base-url";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_MIN_INTERVAL_MS: &str = "min-interval-ms";
const ARG_CONCURRENCY: &str = "concurrency";
const ARG_CUTOFF: &str = "cutoff";
const ARG_SESSION: &str = "session";
const ARG_VIEW: &str = "view";
const ENV_RESET_SESSIONS: &str = "PITWALL_CMDS_RESET_SESSIONS";
const ENV_QUERY_VIEW: &str = "PITWALL_CMDS_QUERY_VIEW";

/// Database file used when none is configured.
pub const DEFAULT_DATABASE: &str = "pitwall.db";

/// Run the Pitwall CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut stdout)
}

fn dispatch(command: Command, writer: &mut dyn Write) -> Result<(), CliError> {
    match command {
        Command::Ingest(args) => ingest::run_ingest(args, writer),
        Command::Status(args) => status::run_status(args, writer),
        Command::Reset(args) => reset::run_reset(args, writer),
        Command::Query(args) => query::run_query(args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "pitwall",
    about = "Ingest OpenF1 telemetry into SQLite and query derived views",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch completed sessions from the upstream API into the database.
    Ingest(IngestArgs),
    /// Report the last completed ingestion and stored row counts.
    Status(StatusArgs),
    /// Delete sessions and their laps, pit stops and results.
    Reset(ResetArgs),
    /// Print a derived view as JSON.
    Query(QueryArgs),
}

fn database_or_default(database: Option<Utf8PathBuf>) -> Utf8PathBuf {
    database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
