//! Error type for the SQLite entity store.

use camino::Utf8PathBuf;
use rusqlite::Error as SqliteError;
use thiserror::Error;

/// Errors raised while opening, migrating or querying the telemetry store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory {path:?}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Database location.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A schema migration step failed.
    #[error("failed to execute migration step '{step}'")]
    Migration {
        /// Name of the failing step.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// The database was created by an incompatible schema version.
    #[error(
        "expected telemetry schema version {expected} but found {found}; reset the database before retrying"
    )]
    VersionMismatch {
        /// Version this build understands.
        expected: i64,
        /// Version recorded in the database.
        found: i64,
    },
    /// A statement failed.
    #[error("SQLite operation '{operation}' failed")]
    Sqlite {
        /// Short description of what was being attempted.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// A stored integer does not fit the domain type it maps to.
    #[error("stored {field} value {value} is out of range")]
    ValueOutOfRange {
        /// Column or aggregate being read.
        field: &'static str,
        /// Offending value.
        value: i64,
    },
    /// A stored timestamp could not be parsed.
    #[error("stored timestamp {value:?} in {field} is not valid RFC 3339")]
    InvalidTimestamp {
        /// Column being read.
        field: &'static str,
        /// Raw stored text.
        value: String,
        /// Parser error.
        #[source]
        source: chrono::ParseError,
    },
    /// Another thread panicked while holding the connection.
    #[error("telemetry store connection mutex was poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn sqlite(operation: &'static str) -> impl FnOnce(SqliteError) -> Self {
        move |source| Self::Sqlite { operation, source }
    }
}
