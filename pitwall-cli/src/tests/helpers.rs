//! Test helpers: a stubbed upstream season and a scratch database.

use super::*;
use crate::ingest::{IngestArgs, IngestCommandConfig, run_ingest_with};
use camino::Utf8PathBuf;
use pitwall_core::{CutoffPolicy, test_support::season_day};
use pitwall_data::upstream::{QueryParams, Resource, test_support::StubSource};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

pub(super) const MEETING: u32 = 1240;
pub(super) const RACE: u32 = 500;

/// Upstream with one finished race: driver 1 laps 90.2 and 89.8, driver 2
/// laps 91.0.
pub(super) fn race_upstream() -> StubSource {
    let lap = |driver: u32, lap: u32, duration: f64| {
        json!({
            "session_key": RACE,
            "driver_number": driver,
            "lap_number": lap,
            "lap_duration": duration,
        })
    };
    StubSource::new()
        .with_records(
            Resource::Meetings,
            QueryParams::none(),
            vec![json!({
                "meeting_key": MEETING,
                "meeting_name": "Australian Grand Prix",
                "year": 2024,
                "date_start": season_day(20, 0).to_rfc3339(),
            })],
        )
        .with_records(
            Resource::Sessions,
            QueryParams::meeting(MEETING.into()),
            vec![json!({
                "session_key": RACE,
                "meeting_key": MEETING,
                "session_name": "Race",
                "session_type": "Race",
                "date_start": season_day(22, 4).to_rfc3339(),
                "date_end": season_day(22, 6).to_rfc3339(),
            })],
        )
        .with_records(
            Resource::Drivers,
            QueryParams::session(RACE.into()),
            vec![
                json!({"driver_number": 1, "full_name": "Max Verstappen", "team_name": "Red Bull Racing"}),
                json!({"driver_number": 2, "full_name": "Logan Sargeant", "team_name": "Williams"}),
            ],
        )
        .with_records(
            Resource::Laps,
            QueryParams::session(RACE.into()),
            vec![lap(1, 1, 90.2), lap(1, 2, 89.8), lap(2, 1, 91.0)],
        )
        .with_records(
            Resource::SessionResult,
            QueryParams::session(RACE.into()),
            vec![
                json!({"session_key": RACE, "driver_number": 1, "position": 1}),
                json!({"session_key": RACE, "driver_number": 2, "position": 2}),
            ],
        )
}

/// A temporary directory holding the database under test.
pub(super) struct Scratch {
    _dir: TempDir,
    pub(super) database: Utf8PathBuf,
}

impl Scratch {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Self {
            database: root.join("data").join("pitwall.db"),
            _dir: dir,
        }
    }

    /// Ingest [`race_upstream`] into the scratch database.
    pub(super) fn ingest_race(&self) -> Value {
        let args = IngestArgs {
            database: Some(self.database.clone()),
            ..IngestArgs::default()
        };
        let mut config = IngestCommandConfig::try_from(args).expect("ingest config");
        config.ingest = config
            .ingest
            .with_cutoff(CutoffPolicy::Fixed(season_day(30, 0)));
        let mut output = Vec::new();
        run_ingest_with(&config, Arc::new(race_upstream()), &mut output).expect("ingest");
        serde_json::from_slice(&output).expect("report is JSON")
    }
}

/// Parse and dispatch `argv` (without the binary name), capturing stdout.
pub(super) fn invoke(argv: &[&str]) -> Result<Value, CliError> {
    let invocation = std::iter::once("pitwall").chain(argv.iter().copied());
    let cli = Cli::try_parse_from(invocation).map_err(CliError::ArgumentParsing)?;
    let mut output = Vec::new();
    dispatch(cli.command, &mut output)?;
    Ok(serde_json::from_slice(&output).expect("command output is JSON"))
}
