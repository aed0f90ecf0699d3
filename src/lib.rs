//! Facade crate for Pitwall, a motorsport telemetry ingester and query engine.
//!
//! This crate re-exports the core domain types and exposes the SQLite store,
//! the ingestion pipeline and the derived views behind feature flags.

#![forbid(unsafe_code)]

pub use pitwall_core::{
    CutoffPolicy, Driver, DriverNumber, IdParseError, Lap, Meeting, MeetingId, PitStop, Session,
    SessionId, SessionResult, is_complete_before,
};

#[cfg(feature = "store-sqlite")]
pub use pitwall_core::{
    CareerLap, RowCounts, SeasonCounts, SessionScope, StoreError, TelemetryStore,
};

#[cfg(feature = "ingest")]
pub use pitwall_data::{
    FetchCause, FetchError, HttpUpstreamSource, IngestConfig, IngestError, IngestStatus,
    Ingestor, RunOutcome, RunReport, RunStage, TriggerOutcome, UpstreamConfig, UpstreamSource,
};

#[cfg(feature = "views")]
pub use pitwall_views::{QueryArgs, QueryError, QueryService, View};

/// Derived views, re-exported in full.
#[cfg(feature = "views")]
pub mod views {
    pub use pitwall_views::*;
}
