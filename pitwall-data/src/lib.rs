//! Data acquisition for Pitwall.
//!
//! Responsibilities:
//! - Talk to the upstream telemetry API through [`upstream::UpstreamSource`].
//! - Turn loosely shaped upstream records into typed entities.
//! - Drive ingestion runs into a [`pitwall_core::TelemetryStore`].
//!
//! Boundaries:
//! - Domain types and persistence live in `pitwall-core`.
//! - Derived views live in `pitwall-views`.
//!
//! Invariants:
//! - At most one ingestion run per [`ingest::Ingestor`] at a time.
//! - Blocking store writes never run on the async executor.

#![forbid(unsafe_code)]

pub mod ingest;
pub mod upstream;

pub use ingest::{
    IngestConfig, IngestError, IngestStatus, Ingestor, RunOutcome, RunReport, RunStage,
    TriggerOutcome,
};
pub use upstream::{FetchCause, FetchError, HttpUpstreamSource, UpstreamConfig, UpstreamSource};
