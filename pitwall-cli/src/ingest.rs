//! `ingest` command: one full ingestion run against the upstream API.

use std::{io::Write, sync::Arc, time::Duration};

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use pitwall_core::{CutoffPolicy, TelemetryStore};
use pitwall_data::{
    IngestConfig, Ingestor, RunReport,
    upstream::{
        DEFAULT_BASE_URL, DEFAULT_MIN_INTERVAL_MS, DEFAULT_TIMEOUT_SECS, HttpUpstreamSource,
        UpstreamConfig, UpstreamSource,
    },
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    ARG_BASE_URL, ARG_CONCURRENCY, ARG_CUTOFF, ARG_DATABASE, ARG_MIN_INTERVAL_MS,
    ARG_TIMEOUT_SECS, CliError, database_or_default, write_json,
};

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch meetings, sessions, drivers, laps, pit stops and \
                 classifications from the upstream API and store every \
                 session that ended before the cutoff. Re-running is safe: \
                 each session's facts are replaced in place.",
    about = "Ingest completed sessions into the database"
)]
#[ortho_config(prefix = "PITWALL")]
pub(crate) struct IngestArgs {
    /// SQLite database file.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Upstream API base URL.
    #[arg(long = ARG_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Minimum delay between upstream requests in milliseconds.
    #[arg(long = ARG_MIN_INTERVAL_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) min_interval_ms: Option<u64>,
    /// Meetings or sessions fetched concurrently.
    #[arg(long = ARG_CONCURRENCY, value_name = "n")]
    #[serde(default)]
    pub(crate) concurrency: Option<usize>,
    /// Fixed RFC 3339 cutoff instant; defaults to the start of today (UTC).
    #[arg(long = ARG_CUTOFF, value_name = "rfc3339")]
    #[serde(default)]
    pub(crate) cutoff: Option<String>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestCommandConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestCommandConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestCommandConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) upstream: UpstreamConfig,
    pub(crate) ingest: IngestConfig,
}

impl TryFrom<IngestArgs> for IngestCommandConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        let upstream = UpstreamConfig::new(
            args.base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        )
        .with_timeout(Duration::from_secs(
            args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        ))
        .with_min_interval(Duration::from_millis(
            args.min_interval_ms.unwrap_or(DEFAULT_MIN_INTERVAL_MS),
        ));

        let mut ingest = IngestConfig::default().with_cutoff(parse_cutoff(args.cutoff.as_deref())?);
        if let Some(concurrency) = args.concurrency {
            ingest = ingest.with_concurrency(concurrency);
        }

        Ok(Self {
            database: database_or_default(args.database),
            upstream,
            ingest,
        })
    }
}

fn parse_cutoff(raw: Option<&str>) -> Result<CutoffPolicy, CliError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(CutoffPolicy::StartOfTodayUtc);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|instant| CutoffPolicy::Fixed(instant.with_timezone(&Utc)))
        .map_err(|err| CliError::InvalidArgument {
            field: ARG_CUTOFF,
            reason: format!("`{raw}` is not an RFC 3339 timestamp: {err}"),
        })
}

pub(crate) fn run_ingest(args: IngestArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    let source = HttpUpstreamSource::with_config(config.upstream.clone()).map_err(|source| {
        CliError::BuildClient {
            base_url: config.upstream.base_url.clone(),
            source,
        }
    })?;
    run_ingest_with(&config, Arc::new(source), writer)
}

/// Run one ingestion against `source` and print its report.
pub(crate) fn run_ingest_with(
    config: &IngestCommandConfig,
    source: Arc<dyn UpstreamSource>,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let store = TelemetryStore::open(&config.database).map_err(|source| CliError::OpenStore {
        path: config.database.clone(),
        source,
    })?;
    let ingestor = Ingestor::new(source, Arc::new(store), config.ingest);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let report: RunReport = runtime.block_on(ingestor.run_now())?;
    info!(
        sessions = report.sessions_retained,
        laps = report.laps,
        skipped = report.skipped,
        "ingestion finished into {}",
        config.database
    );
    write_json(writer, &report)
}
