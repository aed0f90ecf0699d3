//! SQLite-backed entity store for normalised telemetry.
//!
//! The store owns a single connection guarded by a mutex so one instance can
//! be shared between an ingestion run and concurrent readers. Every write is
//! one transaction; the per-session replacement helpers clear and rewrite one
//! entity kind of one session atomically, so readers observe either the old or
//! the new rows but never a mix.
//!
//! The module is split into focused submodules:
//! - `schema` creates the tables and checks the schema version.
//! - `write` holds upserts, scoped clears and bulk inserts.
//! - `read` holds lookups, listings and aggregate counts.
#![forbid(unsafe_code)]

mod columns;
mod error;
mod paths;
mod read;
mod schema;
mod write;

use std::sync::{Mutex, MutexGuard};

use camino::Utf8Path;
use rusqlite::Connection;
use serde::Serialize;

pub use error::StoreError;
pub use read::{CareerLap, SeasonCounts};
pub use schema::SCHEMA_VERSION;

/// Metadata key holding the completion timestamp of the last successful run.
pub const LAST_UPDATE_KEY: &str = "last_update_utc";

/// Session-scoped entity kinds that are replaced wholesale on re-ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionScope {
    /// Rows in `laps`.
    Laps,
    /// Rows in `pit_stops`.
    PitStops,
    /// Rows in `session_results`.
    Results,
}

impl SessionScope {
    const fn delete_sql(self) -> &'static str {
        match self {
            Self::Laps => "DELETE FROM laps WHERE session_key = ?1",
            Self::PitStops => "DELETE FROM pit_stops WHERE session_key = ?1",
            Self::Results => "DELETE FROM session_results WHERE session_key = ?1",
        }
    }
}

/// Row totals per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    /// Stored meetings.
    pub meetings: u64,
    /// Stored sessions.
    pub sessions: u64,
    /// Stored drivers.
    pub drivers: u64,
    /// Stored laps.
    pub laps: u64,
    /// Stored pit stops.
    pub pit_stops: u64,
    /// Stored classification rows.
    pub results: u64,
}

/// Relational store for meetings, sessions, drivers and per-session facts.
///
/// # Examples
///
/// ```
/// use pitwall_core::{TelemetryStore, RowCounts};
///
/// let store = TelemetryStore::open_in_memory().expect("open store");
/// assert_eq!(store.row_counts().expect("count rows"), RowCounts::default());
/// ```
#[derive(Debug)]
pub struct TelemetryStore {
    connection: Mutex<Connection>,
}

impl TelemetryStore {
    /// Open or create a database file, creating missing parent directories.
    ///
    /// Foreign keys are enabled and the schema is created if absent. A file
    /// written by a different schema version is rejected with
    /// [`StoreError::VersionMismatch`].
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        paths::ensure_parent_dir(path)?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| StoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".into(),
            source,
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, StoreError> {
        schema::initialise_schema(&mut connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection.lock().map_err(|_| StoreError::Poisoned)
    }
}
