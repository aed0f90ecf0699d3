//! Run state machine driving one ingestion pass.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use futures_util::{StreamExt, stream};
use log::{error, info, warn};
use pitwall_core::{Driver, MeetingId, SessionId, StoreError, TelemetryStore};
use serde::de::DeserializeOwned;

use super::{
    IngestConfig, IngestError, IngestStatus, RunGuard, RunHandle, RunOutcome, RunReport, RunStage,
    RunToken, TriggerOutcome, normalize,
};
use crate::upstream::{
    DriverRecord, LapRecord, MeetingRecord, PitRecord, QueryParams, Resource, SessionRecord,
    SessionResultRecord, StintRecord, UpstreamSource, decode_records,
};

/// Pulls from an [`UpstreamSource`] and writes into a [`TelemetryStore`].
///
/// Cloning is cheap; clones share the run guard and status.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use pitwall_core::TelemetryStore;
/// use pitwall_data::ingest::{IngestConfig, Ingestor, RunStage};
/// use pitwall_data::upstream::test_support::StubSource;
///
/// let store = Arc::new(TelemetryStore::open_in_memory().unwrap());
/// let ingestor = Ingestor::new(Arc::new(StubSource::new()), store, IngestConfig::default());
///
/// let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
/// let report = runtime.block_on(ingestor.run_now()).unwrap();
/// assert_eq!(report.meetings, 0);
/// assert_eq!(ingestor.status().unwrap().stage, RunStage::Done);
/// ```
#[derive(Clone)]
pub struct Ingestor {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn UpstreamSource>,
    store: Arc<TelemetryStore>,
    config: IngestConfig,
    guard: RunGuard,
    state: Mutex<RunState>,
}

#[derive(Debug, Default)]
struct RunState {
    stage: RunStage,
    last_outcome: Option<RunOutcome>,
}

/// Per-session counters merged into the run report.
#[derive(Debug, Default)]
struct DetailTally {
    laps: usize,
    pit_stops: usize,
    results: usize,
    skipped: usize,
    quarantined: usize,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("config", &self.inner.config)
            .field("running", &self.inner.guard.is_running())
            .finish_non_exhaustive()
    }
}

impl Ingestor {
    /// Create an ingestor over `source` and `store`.
    #[must_use]
    pub fn new(
        source: Arc<dyn UpstreamSource>,
        store: Arc<TelemetryStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                store,
                config,
                guard: RunGuard::default(),
                state: Mutex::new(RunState::default()),
            }),
        }
    }

    /// Start a run in the background unless one is already active.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn trigger(&self) -> TriggerOutcome {
        let Some(token) = self.inner.guard.try_acquire() else {
            info!("ingestion trigger ignored: a run is already in progress");
            return TriggerOutcome::AlreadyRunning;
        };
        let this = self.clone();
        let task = tokio::spawn(async move { this.execute(token).await });
        TriggerOutcome::Started(RunHandle { task })
    }

    /// Run to completion on the current task.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::AlreadyRunning`] if another run is active, or
    /// the error that aborted this run.
    pub async fn run_now(&self) -> Result<RunReport, IngestError> {
        let token = self
            .inner
            .guard
            .try_acquire()
            .ok_or(IngestError::AlreadyRunning)?;
        self.execute(token).await
    }

    /// Current run state and the last recorded completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion timestamp cannot be read.
    pub fn status(&self) -> Result<IngestStatus, StoreError> {
        let last_completed = self.inner.store.last_completion()?;
        let state = self.state();
        Ok(IngestStatus {
            running: self.inner.guard.is_running(),
            stage: state.stage,
            last_completed,
            last_outcome: state.last_outcome.clone(),
        })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RunState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self, stage: RunStage) {
        info!("ingestion stage: {stage}");
        self.state().stage = stage;
    }

    async fn execute(&self, token: RunToken) -> Result<RunReport, IngestError> {
        let cutoff = self.inner.config.cutoff().resolve(Utc::now());
        let mut report = RunReport::starting_at(cutoff);

        let outcome = match self.run_stages(cutoff, &mut report).await {
            Ok(completed_at) => {
                info!(
                    "ingestion completed: {} meetings, {} sessions retained, {} laps, {} skipped",
                    report.meetings, report.sessions_retained, report.laps, report.skipped
                );
                self.finish(RunStage::Done, RunOutcome::Completed {
                    completed_at,
                    report,
                });
                Ok(report)
            }
            Err(err) => {
                error!("ingestion aborted: {err}");
                self.finish(RunStage::Aborted, RunOutcome::Aborted {
                    reason: err.to_string(),
                    report,
                });
                Err(err)
            }
        };
        drop(token);
        outcome
    }

    fn finish(&self, stage: RunStage, outcome: RunOutcome) {
        let mut state = self.state();
        state.stage = stage;
        state.last_outcome = Some(outcome);
    }

    async fn run_stages(
        &self,
        cutoff: DateTime<Utc>,
        report: &mut RunReport,
    ) -> Result<DateTime<Utc>, IngestError> {
        self.enter(RunStage::FetchingMeetings);
        let raw = self
            .inner
            .source
            .fetch(Resource::Meetings, QueryParams::none())
            .await
            .map_err(IngestError::Meetings)?;
        let decoded = decode_records::<MeetingRecord>(Resource::Meetings, raw);
        report.quarantined += decoded.quarantined;
        let meetings = normalize::meetings(decoded.records);
        report.meetings = self
            .with_store(RunStage::FetchingMeetings, move |store| {
                store.upsert_meetings(&meetings)
            })
            .await?;

        self.enter(RunStage::FetchingSessions);
        let stored = self
            .with_store(RunStage::FetchingSessions, TelemetryStore::meetings)
            .await?;
        let fetched = self
            .fan_out(
                stored.into_iter().map(|meeting| meeting.id),
                Self::fetch_sessions,
            )
            .await;

        self.enter(RunStage::FilteringSessions);
        let mut retained = Vec::new();
        for outcome in fetched {
            match outcome {
                Some((meeting, records, quarantined)) => {
                    report.quarantined += quarantined;
                    report.sessions_seen += records.len();
                    let filter = normalize::sessions(meeting, records, cutoff);
                    report.sessions_rejected += filter.rejected;
                    retained.extend(filter.retained);
                }
                None => report.skipped += 1,
            }
        }
        // Oldest first: later driver upserts must carry the latest team.
        retained.sort_by_key(|session| (session.end_time, session.id));
        let session_ids: Vec<SessionId> = retained.iter().map(|session| session.id).collect();
        report.sessions_retained = self
            .with_store(RunStage::FilteringSessions, move |store| {
                store.upsert_sessions(&retained)
            })
            .await?;

        self.enter(RunStage::FetchingSessionDetails);
        let details = self
            .fan_out(session_ids.iter().copied(), Self::ingest_session)
            .await;
        let mut rosters = HashMap::new();
        for (session, drivers, tally) in details {
            if let Some(drivers) = drivers {
                rosters.insert(session, drivers);
            }
            report.laps += tally.laps;
            report.pit_stops += tally.pit_stops;
            report.results += tally.results;
            report.skipped += tally.skipped;
            report.quarantined += tally.quarantined;
        }
        for session in session_ids {
            let Some(drivers) = rosters.remove(&session) else {
                continue;
            };
            let mut tally = DetailTally::default();
            if let Some(written) = self
                .write_detail(session, "drivers", &mut tally, move |store| {
                    store.upsert_drivers(&drivers)
                })
                .await
            {
                report.drivers += written;
            }
            report.skipped += tally.skipped;
        }

        let completed_at = Utc::now();
        self.with_store(RunStage::Done, move |store| {
            store.record_completion(completed_at)
        })
        .await?;
        Ok(completed_at)
    }

    /// Run `work` for every item with at most `concurrency` in flight.
    async fn fan_out<I, T, F, Fut>(&self, items: I, work: F) -> Vec<T>
    where
        I: IntoIterator,
        F: Fn(Self, I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        let pending: Vec<Fut> = items
            .into_iter()
            .map(|item| work(self.clone(), item))
            .collect();
        stream::iter(pending)
            .buffer_unordered(self.inner.config.concurrency())
            .collect()
            .await
    }

    async fn fetch_sessions(
        self,
        meeting: MeetingId,
    ) -> Option<(MeetingId, Vec<SessionRecord>, usize)> {
        match self
            .inner
            .source
            .fetch(Resource::Sessions, QueryParams::meeting(meeting))
            .await
        {
            Ok(raw) => {
                let decoded = decode_records::<SessionRecord>(Resource::Sessions, raw);
                Some((meeting, decoded.records, decoded.quarantined))
            }
            Err(err) => {
                warn!("skipping sessions of meeting {meeting}: {err}");
                None
            }
        }
    }

    /// Fetch and store one session's facts.
    ///
    /// Drivers are returned rather than written so the caller can apply them
    /// in session order.
    async fn ingest_session(
        self,
        session: SessionId,
    ) -> (SessionId, Option<Vec<Driver>>, DetailTally) {
        let mut tally = DetailTally::default();

        let drivers = self
            .fetch_detail::<DriverRecord>(Resource::Drivers, session, &mut tally)
            .await
            .map(normalize::drivers);

        let stints = self
            .fetch_detail::<StintRecord>(Resource::Stints, session, &mut tally)
            .await
            .unwrap_or_default();
        if let Some(records) = self
            .fetch_detail::<LapRecord>(Resource::Laps, session, &mut tally)
            .await
        {
            let laps = normalize::laps(session, records, &stints);
            if let Some(written) = self
                .write_detail(session, "laps", &mut tally, move |store| {
                    store.replace_session_laps(session, &laps)
                })
                .await
            {
                tally.laps += written;
            }
        }

        if let Some(records) = self
            .fetch_detail::<PitRecord>(Resource::Pit, session, &mut tally)
            .await
        {
            let stops = normalize::pit_stops(session, records);
            if let Some(written) = self
                .write_detail(session, "pit stops", &mut tally, move |store| {
                    store.replace_session_pit_stops(session, &stops)
                })
                .await
            {
                tally.pit_stops += written;
            }
        }

        if let Some(records) = self
            .fetch_detail::<SessionResultRecord>(Resource::SessionResult, session, &mut tally)
            .await
        {
            let results = normalize::results(session, records);
            if let Some(written) = self
                .write_detail(session, "results", &mut tally, move |store| {
                    store.replace_session_results(session, &results)
                })
                .await
            {
                tally.results += written;
            }
        }

        (session, drivers, tally)
    }

    async fn fetch_detail<T: DeserializeOwned>(
        &self,
        resource: Resource,
        session: SessionId,
        tally: &mut DetailTally,
    ) -> Option<Vec<T>> {
        match self
            .inner
            .source
            .fetch(resource, QueryParams::session(session))
            .await
        {
            Ok(raw) => {
                let decoded = decode_records::<T>(resource, raw);
                tally.quarantined += decoded.quarantined;
                Some(decoded.records)
            }
            Err(err) => {
                warn!("skipping {resource} for session {session}: {err}");
                tally.skipped += 1;
                None
            }
        }
    }

    async fn write_detail<W>(
        &self,
        session: SessionId,
        what: &'static str,
        tally: &mut DetailTally,
        work: W,
    ) -> Option<usize>
    where
        W: FnOnce(&TelemetryStore) -> Result<usize, StoreError> + Send + 'static,
    {
        match self.with_store(RunStage::FetchingSessionDetails, work).await {
            Ok(written) => Some(written),
            Err(err) => {
                warn!("skipping {what} for session {session}: {err}");
                tally.skipped += 1;
                None
            }
        }
    }

    /// Run blocking store work off the async executor.
    async fn with_store<T, W>(&self, stage: RunStage, work: W) -> Result<T, IngestError>
    where
        T: Send + 'static,
        W: FnOnce(&TelemetryStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.inner.store);
        tokio::task::spawn_blocking(move || work(&store))
            .await
            .map_err(|err| IngestError::Worker {
                message: err.to_string(),
            })?
            .map_err(|source| IngestError::Store { stage, source })
    }
}
