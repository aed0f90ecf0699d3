//! Ingestion pipeline from the upstream API into the telemetry store.
//!
//! A run moves through [`RunStage`]s in order:
//!
//! 1. fetch all meetings and upsert them; failure here aborts the run before
//!    anything is written;
//! 2. fetch sessions for every stored meeting;
//! 3. keep sessions that ended before the cutoff and upsert them;
//! 4. for each retained session fetch drivers, stints, laps, pit stops and the
//!    classification, replacing that session's rows one entity kind at a
//!    time;
//! 5. record the completion timestamp.
//!
//! Failures in steps 2 and 4 are logged, counted in the [`RunReport`] and
//! skipped at the smallest failing unit. Only one run may be active per
//! [`Ingestor`]; a second trigger is answered with
//! [`TriggerOutcome::AlreadyRunning`].

mod config;
mod error;
mod guard;
mod normalize;
mod orchestrator;
mod status;

pub use config::{DEFAULT_CONCURRENCY, IngestConfig};
pub use error::IngestError;
pub use guard::{RunGuard, RunToken};
pub use orchestrator::Ingestor;
pub use status::{IngestStatus, RunHandle, RunOutcome, RunReport, RunStage, TriggerOutcome};
