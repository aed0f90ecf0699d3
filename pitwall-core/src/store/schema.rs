//! Schema creation and version checks for the telemetry database.

use rusqlite::{Connection, OptionalExtension, Transaction};

use super::StoreError;

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Create every table and index the store relies on and record the version.
///
/// Re-running against an initialised database is a no-op. A database written
/// by a different schema version is rejected.
pub(crate) fn initialise_schema(connection: &mut Connection) -> Result<(), StoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| StoreError::Migration {
            step: "enable foreign keys",
            source,
        })?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_event_tables(&transaction)?;
    create_session_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_event_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create meetings",
        "CREATE TABLE IF NOT EXISTS meetings (
            meeting_key INTEGER PRIMARY KEY,
            meeting_name TEXT NOT NULL,
            circuit_key INTEGER,
            circuit_short_name TEXT,
            location TEXT,
            country_name TEXT,
            country_code TEXT,
            year INTEGER NOT NULL,
            date_start TEXT NOT NULL
        )",
    )?;
    run_migration_step(
        transaction,
        "create sessions",
        "CREATE TABLE IF NOT EXISTS sessions (
            session_key INTEGER PRIMARY KEY,
            meeting_key INTEGER NOT NULL,
            session_name TEXT NOT NULL,
            session_type TEXT NOT NULL,
            date_start TEXT NOT NULL,
            date_end TEXT NOT NULL,
            FOREIGN KEY (meeting_key) REFERENCES meetings(meeting_key) ON DELETE CASCADE
        )",
    )?;
    run_migration_step(
        transaction,
        "create drivers",
        "CREATE TABLE IF NOT EXISTS drivers (
            driver_number INTEGER PRIMARY KEY,
            full_name TEXT NOT NULL,
            first_name TEXT,
            last_name TEXT,
            name_acronym TEXT,
            country_code TEXT,
            team_name TEXT,
            team_colour TEXT,
            headshot_url TEXT
        )",
    )?;
    run_migration_step(
        transaction,
        "create metadata",
        "CREATE TABLE IF NOT EXISTS metadata (
            key TEXT PRIMARY KEY CHECK (length(trim(key)) > 0),
            value TEXT NOT NULL
        ) WITHOUT ROWID",
    )
}

// Laps, results and pit stops reference drivers by number only: upstream
// routinely reports laps for drivers whose metadata is missing.
fn create_session_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create laps",
        "CREATE TABLE IF NOT EXISTS laps (
            session_key INTEGER NOT NULL,
            driver_number INTEGER NOT NULL,
            lap_number INTEGER NOT NULL CHECK (lap_number > 0),
            lap_duration REAL,
            is_pit_out_lap INTEGER NOT NULL DEFAULT 0,
            stint INTEGER,
            tyre_compound TEXT,
            position INTEGER,
            PRIMARY KEY (session_key, driver_number, lap_number),
            FOREIGN KEY (session_key) REFERENCES sessions(session_key) ON DELETE CASCADE
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create session_results",
        "CREATE TABLE IF NOT EXISTS session_results (
            session_key INTEGER NOT NULL,
            driver_number INTEGER NOT NULL,
            position INTEGER,
            laps_completed INTEGER NOT NULL DEFAULT 0,
            dnf INTEGER NOT NULL DEFAULT 0,
            dns INTEGER NOT NULL DEFAULT 0,
            dsq INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (session_key, driver_number),
            FOREIGN KEY (session_key) REFERENCES sessions(session_key) ON DELETE CASCADE
        ) WITHOUT ROWID",
    )?;
    run_migration_step(
        transaction,
        "create pit_stops",
        "CREATE TABLE IF NOT EXISTS pit_stops (
            session_key INTEGER NOT NULL,
            driver_number INTEGER NOT NULL,
            stop_sequence INTEGER NOT NULL CHECK (stop_sequence > 0),
            lap_number INTEGER NOT NULL,
            pit_duration REAL,
            PRIMARY KEY (session_key, driver_number, stop_sequence),
            FOREIGN KEY (session_key) REFERENCES sessions(session_key) ON DELETE CASCADE
        ) WITHOUT ROWID",
    )
}

fn create_indexes(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "index sessions by meeting",
        "CREATE INDEX IF NOT EXISTS idx_sessions_meeting ON sessions(meeting_key, date_start)",
    )?;
    run_migration_step(
        transaction,
        "index meetings by year",
        "CREATE INDEX IF NOT EXISTS idx_meetings_year ON meetings(year)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS telemetry_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM telemetry_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(StoreError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO telemetry_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| StoreError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Migration { step, source })
}
