//! `status` command: last completed ingestion and stored row counts.

use std::io::Write;

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pitwall_core::{RowCounts, TelemetryStore};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, database_or_default, write_json};

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(about = "Show the last completed ingestion and stored row counts")]
#[ortho_config(prefix = "PITWALL")]
pub(crate) struct StatusArgs {
    /// SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

/// Printed by `pitwall status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct StoreStatus {
    pub(crate) database: Utf8PathBuf,
    pub(crate) last_completed: Option<DateTime<Utc>>,
    pub(crate) counts: RowCounts,
}

pub(crate) fn store_status(database: Utf8PathBuf) -> Result<StoreStatus, CliError> {
    let store = TelemetryStore::open(&database).map_err(|source| CliError::OpenStore {
        path: database.clone(),
        source,
    })?;
    Ok(StoreStatus {
        last_completed: store.last_completion()?,
        counts: store.row_counts()?,
        database,
    })
}

pub(crate) fn run_status(args: StatusArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let status = store_status(database_or_default(merged.database))?;
    write_json(writer, &status)
}
