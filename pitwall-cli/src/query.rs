//! `query` command: print one derived view as JSON.

use std::{io::Write, sync::Arc};

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pitwall_core::TelemetryStore;
use pitwall_views::{QueryArgs as ViewArgs, QueryService, View};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ARG_DATABASE, ARG_VIEW, CliError, ENV_QUERY_VIEW, database_or_default, write_json};

/// CLI arguments for the `query` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Compute a derived view from the database. Views: meetings, \
                 meeting, sessions, session, laps, driver-laps, drivers, driver, \
                 driver-career, fastest-laps, team-pace, tyre-analysis, classification, \
                 compare, season and years.",
    about = "Print a derived view as JSON"
)]
#[ortho_config(prefix = "PITWALL")]
pub(crate) struct QueryArgs {
    /// View to compute.
    #[arg(value_name = "view")]
    #[serde(default)]
    pub(crate) view: Option<String>,
    /// SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Session key.
    #[arg(long = "session", value_name = "session_key")]
    #[serde(default)]
    pub(crate) session: Option<String>,
    /// Meeting key.
    #[arg(long = "meeting", value_name = "meeting_key")]
    #[serde(default)]
    pub(crate) meeting: Option<String>,
    /// Car number, for `driver-laps`, `driver` and `driver-career`.
    #[arg(long = "driver", value_name = "number")]
    #[serde(default)]
    pub(crate) driver: Option<String>,
    /// Comma-separated car numbers, for `compare`.
    #[arg(long = "drivers", value_name = "list")]
    #[serde(default)]
    pub(crate) drivers: Option<String>,
    /// Championship year, for `season`.
    #[arg(long = "year", value_name = "year")]
    #[serde(default)]
    pub(crate) year: Option<String>,
    /// Session type filter, for `sessions`.
    #[arg(long = "session-type", value_name = "type")]
    #[serde(default)]
    pub(crate) session_type: Option<String>,
    /// `all` or `fastest`, for `laps`.
    #[arg(long = "mode", value_name = "mode")]
    #[serde(default)]
    pub(crate) mode: Option<String>,
}

impl QueryArgs {
    fn view(&self) -> Result<View, CliError> {
        let raw = self.view.as_deref().ok_or(CliError::MissingArgument {
            field: ARG_VIEW,
            env: ENV_QUERY_VIEW,
        })?;
        Ok(raw.parse::<View>()?)
    }

    fn view_args(self) -> ViewArgs {
        ViewArgs {
            session_key: self.session,
            meeting_key: self.meeting,
            driver_number: self.driver,
            drivers: self.drivers,
            session_type: self.session_type,
            year: self.year,
            mode: self.mode,
        }
    }
}

/// Answer the query in `args` from `store`.
pub(crate) fn answer(store: Arc<TelemetryStore>, args: QueryArgs) -> Result<Value, CliError> {
    let view = args.view()?;
    let service = QueryService::new(store);
    Ok(service.run(view, &args.view_args())?)
}

pub(crate) fn run_query(args: QueryArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let database = database_or_default(merged.database.clone());
    let store = TelemetryStore::open(&database).map_err(|source| CliError::OpenStore {
        path: database.clone(),
        source,
    })?;
    let value = answer(Arc::new(store), merged)?;
    write_json(writer, &value)
}
