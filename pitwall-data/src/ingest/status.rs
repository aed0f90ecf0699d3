//! Run stages, reports and the status snapshot exposed to callers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::IngestError;

/// Stage an ingestion run is in, or last finished in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    /// No run has started since the ingestor was created.
    #[default]
    Idle,
    /// Fetching and storing the meeting list.
    FetchingMeetings,
    /// Fetching sessions for each stored meeting.
    FetchingSessions,
    /// Applying the completion cutoff and storing retained sessions.
    FilteringSessions,
    /// Fetching drivers, laps, pit stops and results per session.
    FetchingSessionDetails,
    /// The last run completed.
    Done,
    /// The last run stopped early.
    Aborted,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::FetchingMeetings => "fetching meetings",
            Self::FetchingSessions => "fetching sessions",
            Self::FilteringSessions => "filtering sessions",
            Self::FetchingSessionDetails => "fetching session details",
            Self::Done => "done",
            Self::Aborted => "aborted",
        })
    }
}

/// Counters gathered over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Cutoff instant applied to sessions.
    pub cutoff: Option<DateTime<Utc>>,
    /// Meetings upserted.
    pub meetings: usize,
    /// Session records returned by the upstream.
    pub sessions_seen: usize,
    /// Sessions that passed the cutoff and were upserted.
    pub sessions_retained: usize,
    /// Sessions rejected by the cutoff.
    pub sessions_rejected: usize,
    /// Driver rows upserted, counted once per session.
    pub drivers: usize,
    /// Lap rows written.
    pub laps: usize,
    /// Pit stop rows written.
    pub pit_stops: usize,
    /// Classification rows written.
    pub results: usize,
    /// Units of work skipped after an upstream or store failure.
    pub skipped: usize,
    /// Upstream records dropped because they did not decode.
    pub quarantined: usize,
}

impl RunReport {
    pub(crate) fn starting_at(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff: Some(cutoff),
            ..Self::default()
        }
    }
}

/// How the most recent run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stage ran; the completion timestamp was recorded.
    Completed {
        /// Completion instant written to the store.
        completed_at: DateTime<Utc>,
        /// Counters for the run.
        report: RunReport,
    },
    /// The run stopped before completing.
    Aborted {
        /// Human-readable cause.
        reason: String,
        /// Counters up to the point of failure.
        report: RunReport,
    },
}

/// Snapshot returned by [`Ingestor::status`](super::Ingestor::status).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestStatus {
    /// Whether a run currently holds the run slot.
    pub running: bool,
    /// Current stage, or the final stage of the last run.
    pub stage: RunStage,
    /// Completion timestamp of the last successful run, from the store.
    pub last_completed: Option<DateTime<Utc>>,
    /// Outcome of the last run started by this ingestor.
    pub last_outcome: Option<RunOutcome>,
}

/// Result of [`Ingestor::trigger`](super::Ingestor::trigger).
#[derive(Debug)]
pub enum TriggerOutcome {
    /// A new run was spawned.
    Started(RunHandle),
    /// Another run is active; nothing was started.
    AlreadyRunning,
}

/// Handle to a spawned run.
#[derive(Debug)]
pub struct RunHandle {
    pub(crate) task: tokio::task::JoinHandle<Result<RunReport, IngestError>>,
}

impl RunHandle {
    /// Wait for the run to finish.
    ///
    /// # Errors
    ///
    /// Returns the run's own error, or [`IngestError::Worker`] if the task
    /// panicked.
    pub async fn wait(self) -> Result<RunReport, IngestError> {
        self.task.await.map_err(|err| IngestError::Worker {
            message: err.to_string(),
        })?
    }
}
