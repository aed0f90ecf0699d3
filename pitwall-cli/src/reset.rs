//! `reset` command: remove sessions so the next ingestion fetches them again.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pitwall_core::{SessionId, TelemetryStore};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    ARG_DATABASE, ARG_SESSION, CliError, ENV_RESET_SESSIONS, database_or_default, write_json,
};

/// CLI arguments for the `reset` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Delete the named sessions together with their laps, pit \
                 stops and classification. Meetings and drivers are kept.",
    about = "Delete stored sessions"
)]
#[ortho_config(prefix = "PITWALL")]
pub(crate) struct ResetArgs {
    /// SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Session key to delete; repeat for several.
    #[arg(long = ARG_SESSION, value_name = "session_key")]
    #[serde(default)]
    pub(crate) sessions: Vec<u32>,
}

/// Printed by `pitwall reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ResetSummary {
    pub(crate) requested: usize,
    pub(crate) removed: usize,
}

pub(crate) fn reset_sessions(
    database: &Utf8Path,
    sessions: &[SessionId],
) -> Result<ResetSummary, CliError> {
    if sessions.is_empty() {
        return Err(CliError::MissingArgument {
            field: ARG_SESSION,
            env: ENV_RESET_SESSIONS,
        });
    }
    let store = TelemetryStore::open(database).map_err(|source| CliError::OpenStore {
        path: database.to_path_buf(),
        source,
    })?;
    let removed = store.reset_sessions(sessions)?;
    info!("removed {removed} of {} sessions from {database}", sessions.len());
    Ok(ResetSummary {
        requested: sessions.len(),
        removed,
    })
}

pub(crate) fn run_reset(args: ResetArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let mut sessions: Vec<SessionId> = merged.sessions.into_iter().map(SessionId::new).collect();
    sessions.sort_unstable();
    sessions.dedup();
    let summary = reset_sessions(&database_or_default(merged.database), &sessions)?;
    write_json(writer, &summary)
}
