//! Errors that end an ingestion run.

use pitwall_core::StoreError;
use thiserror::Error;

use super::RunStage;
use crate::upstream::FetchError;

/// Failure that aborted a run, or prevented one from starting.
///
/// Failures of a single meeting or session are logged and counted in the
/// [`RunReport`](super::RunReport) instead.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Another run holds the run slot.
    #[error("an ingestion run is already in progress")]
    AlreadyRunning,
    /// The meeting list could not be fetched.
    #[error("fetching meetings failed; nothing was changed")]
    Meetings(#[source] FetchError),
    /// A write the rest of the run depends on failed.
    #[error("store write failed while {stage}")]
    Store {
        /// Stage that issued the write.
        stage: RunStage,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// A spawned task panicked or was cancelled.
    #[error("ingestion task failed: {message}")]
    Worker {
        /// Join error description.
        message: String,
    },
}
