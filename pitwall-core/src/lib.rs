//! Core domain types for Pitwall.
//!
//! The crate defines the normalised telemetry entities (meetings, sessions,
//! drivers, laps, pit stops and classifications), the typed upstream keys
//! that identify them, the completion cutoff policy applied during
//! ingestion, and the SQLite-backed [`TelemetryStore`] shared by the
//! ingestion pipeline and the query engine.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod cutoff;
mod ids;
mod model;
#[cfg(feature = "store-sqlite")]
pub mod store;
#[doc(hidden)]
pub mod test_support;

pub use cutoff::{CutoffPolicy, is_complete_before};
pub use ids::{DriverNumber, IdParseError, MeetingId, SessionId};
pub use model::{Driver, Lap, Meeting, PitStop, Session, SessionResult};

#[cfg(feature = "store-sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-sqlite")))]
pub use store::{
    CareerLap, RowCounts, SeasonCounts, SessionScope, StoreError, TelemetryStore,
};
