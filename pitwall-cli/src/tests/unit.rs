//! Focused unit tests covering argument resolution and command outcomes.

use super::helpers::{RACE, Scratch, invoke};
use super::*;
use crate::{
    ingest::{IngestArgs, IngestCommandConfig},
    reset::reset_sessions,
    status::store_status,
};
use pitwall_core::{CutoffPolicy, SessionId};
use pitwall_data::{
    ingest::DEFAULT_CONCURRENCY,
    upstream::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS},
};
use pitwall_views::QueryError;
use rstest::rstest;
use std::time::Duration;

#[rstest]
fn ingest_defaults_fill_unset_options() {
    let config = IngestCommandConfig::try_from(IngestArgs::default()).expect("config");

    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert_eq!(config.upstream.base_url, DEFAULT_BASE_URL);
    assert_eq!(
        config.upstream.timeout,
        Duration::from_secs(DEFAULT_TIMEOUT_SECS)
    );
    assert_eq!(config.ingest.concurrency(), DEFAULT_CONCURRENCY);
    assert_eq!(config.ingest.cutoff(), CutoffPolicy::StartOfTodayUtc);
}

#[rstest]
fn ingest_flags_override_defaults() {
    let cli = Cli::try_parse_from([
        "pitwall",
        "ingest",
        "--base-url",
        "http://localhost:9000/v1",
        "--concurrency",
        "0",
        "--min-interval-ms",
        "10",
        "--cutoff",
        "2024-03-31T00:00:00Z",
    ])
    .expect("parse");
    let Command::Ingest(args) = cli.command else {
        panic!("expected the ingest command");
    };

    let config = IngestCommandConfig::try_from(args).expect("config");

    assert_eq!(config.upstream.base_url, "http://localhost:9000/v1");
    assert_eq!(config.upstream.min_interval, Duration::from_millis(10));
    assert_eq!(config.ingest.concurrency(), 1);
    assert!(matches!(config.ingest.cutoff(), CutoffPolicy::Fixed(_)));
}

#[rstest]
#[case("yesterday")]
#[case("2024-03-31")]
fn malformed_cutoff_is_rejected(#[case] raw: &str) {
    let args = IngestArgs {
        cutoff: Some(raw.to_owned()),
        ..IngestArgs::default()
    };
    let err = IngestCommandConfig::try_from(args).expect_err("cutoff should be rejected");
    match err {
        CliError::InvalidArgument { field, .. } => assert_eq!(field, ARG_CUTOFF),
        other => panic!("expected InvalidArgument, found {other:?}"),
    }
}

#[rstest]
fn reset_requires_at_least_one_session() {
    let scratch = Scratch::new();
    let err = reset_sessions(&scratch.database, &[]).expect_err("should be rejected");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_SESSION);
            assert_eq!(env, ENV_RESET_SESSIONS);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn reset_reports_unknown_sessions_as_not_removed() {
    let scratch = Scratch::new();
    scratch.ingest_race();

    let summary = reset_sessions(
        &scratch.database,
        &[SessionId::new(RACE), SessionId::new(9999)],
    )
    .expect("reset");

    assert_eq!((summary.requested, summary.removed), (2, 1));
    let status = store_status(scratch.database.clone()).expect("status");
    assert_eq!((status.counts.sessions, status.counts.laps), (0, 0));
    assert_eq!(status.counts.meetings, 1);
}

#[rstest]
fn ingest_report_counts_written_rows() {
    let scratch = Scratch::new();

    let report = scratch.ingest_race();

    assert_eq!(report["sessions_retained"], 1);
    assert_eq!(report["laps"], 3);
    assert_eq!(report["results"], 2);
    assert_eq!(report["skipped"], 0);
}

#[rstest]
fn query_without_view_is_rejected() {
    let err = crate::query::answer(
        std::sync::Arc::new(pitwall_core::TelemetryStore::open_in_memory().expect("store")),
        crate::query::QueryArgs::default(),
    )
    .expect_err("should be rejected");
    match err {
        CliError::MissingArgument { field, env } => {
            assert_eq!(field, ARG_VIEW);
            assert_eq!(env, ENV_QUERY_VIEW);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn unknown_view_is_invalid_input() {
    let scratch = Scratch::new();
    let err = invoke(&["query", "podium", "--database", scratch.database.as_str()])
        .expect_err("should be rejected");
    assert!(matches!(
        err,
        CliError::Query(QueryError::InvalidInput { param: "view", .. })
    ));
}

#[rstest]
fn driver_laps_are_queryable_by_car_number() {
    let scratch = Scratch::new();
    scratch.ingest_race();
    let session = RACE.to_string();

    let laps = invoke(&[
        "query",
        "driver-laps",
        "--database",
        scratch.database.as_str(),
        "--session",
        &session,
        "--driver",
        "1",
    ])
    .expect("query");

    let numbers: Vec<_> = laps
        .as_array()
        .expect("list")
        .iter()
        .map(|lap| lap["lap_number"].clone())
        .collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(laps[0]["full_name"], "Max Verstappen");
}

#[rstest]
fn driver_career_joins_session_and_meeting_names() {
    let scratch = Scratch::new();
    scratch.ingest_race();

    let career = invoke(&[
        "query",
        "driver-career",
        "--database",
        scratch.database.as_str(),
        "--driver",
        "1",
    ])
    .expect("query");

    assert_eq!(career["driver_info"]["full_name"], "Max Verstappen");
    let laps = career["career_laps"].as_array().expect("list");
    assert!(!laps.is_empty());
    assert!(laps.iter().all(|lap| lap["driver_number"] == 1));
    assert!(laps.iter().all(|lap| lap["session_id"] == RACE));
    assert!(laps.iter().all(|lap| lap["session_type"] == "Race"));
    assert_eq!(laps[0]["meeting_name"], "Australian Grand Prix");
}
