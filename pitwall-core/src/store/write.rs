//! Mutating operations: upserts, scoped clears, bulk inserts and resets.

use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{Connection, Transaction};

use super::{LAST_UPDATE_KEY, SessionScope, StoreError, TelemetryStore, columns::timestamp_text};
use crate::{Driver, Lap, Meeting, PitStop, Session, SessionId, SessionResult};

const UPSERT_MEETING: &str = "INSERT INTO meetings (
        meeting_key, meeting_name, circuit_key, circuit_short_name,
        location, country_name, country_code, year, date_start
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT (meeting_key) DO UPDATE SET
        meeting_name = excluded.meeting_name,
        circuit_key = excluded.circuit_key,
        circuit_short_name = excluded.circuit_short_name,
        location = excluded.location,
        country_name = excluded.country_name,
        country_code = excluded.country_code,
        year = excluded.year,
        date_start = excluded.date_start";

const UPSERT_SESSION: &str = "INSERT INTO sessions (
        session_key, meeting_key, session_name, session_type, date_start, date_end
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT (session_key) DO UPDATE SET
        meeting_key = excluded.meeting_key,
        session_name = excluded.session_name,
        session_type = excluded.session_type,
        date_start = excluded.date_start,
        date_end = excluded.date_end";

const UPSERT_DRIVER: &str = "INSERT INTO drivers (
        driver_number, full_name, first_name, last_name, name_acronym,
        country_code, team_name, team_colour, headshot_url
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
    ON CONFLICT (driver_number) DO UPDATE SET
        full_name = excluded.full_name,
        first_name = excluded.first_name,
        last_name = excluded.last_name,
        name_acronym = excluded.name_acronym,
        country_code = excluded.country_code,
        team_name = excluded.team_name,
        team_colour = excluded.team_colour,
        headshot_url = excluded.headshot_url";

// Conflicts update in place rather than replace, so no cascade ever fires.
const INSERT_LAP: &str = "INSERT INTO laps (
        session_key, driver_number, lap_number, lap_duration,
        is_pit_out_lap, stint, tyre_compound, position
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT (session_key, driver_number, lap_number) DO UPDATE SET
        lap_duration = excluded.lap_duration,
        is_pit_out_lap = excluded.is_pit_out_lap,
        stint = excluded.stint,
        tyre_compound = excluded.tyre_compound,
        position = excluded.position";

const INSERT_PIT_STOP: &str = "INSERT INTO pit_stops (
        session_key, driver_number, stop_sequence, lap_number, pit_duration
    ) VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (session_key, driver_number, stop_sequence) DO UPDATE SET
        lap_number = excluded.lap_number,
        pit_duration = excluded.pit_duration";

const INSERT_RESULT: &str = "INSERT INTO session_results (
        session_key, driver_number, position, laps_completed, dnf, dns, dsq
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT (session_key, driver_number) DO UPDATE SET
        position = excluded.position,
        laps_completed = excluded.laps_completed,
        dnf = excluded.dnf,
        dns = excluded.dns,
        dsq = excluded.dsq";

impl TelemetryStore {
    /// Insert or update meetings by key in one transaction.
    pub fn upsert_meetings(&self, meetings: &[Meeting]) -> Result<usize, StoreError> {
        self.in_transaction("upsert meetings", |tx| {
            let mut statement = tx
                .prepare_cached(UPSERT_MEETING)
                .map_err(StoreError::sqlite("prepare meeting upsert"))?;
            for meeting in meetings {
                statement
                    .execute((
                        meeting.id,
                        meeting.name.as_str(),
                        meeting.circuit_id,
                        meeting.circuit_short_name.as_deref(),
                        meeting.location.as_deref(),
                        meeting.country.as_deref(),
                        meeting.country_code.as_deref(),
                        meeting.year,
                        timestamp_text(&meeting.start_time),
                    ))
                    .map_err(StoreError::sqlite("upsert meeting"))?;
            }
            Ok(meetings.len())
        })
    }

    /// Insert or update sessions by key in one transaction.
    ///
    /// The owning meetings must already be stored.
    pub fn upsert_sessions(&self, sessions: &[Session]) -> Result<usize, StoreError> {
        self.in_transaction("upsert sessions", |tx| {
            let mut statement = tx
                .prepare_cached(UPSERT_SESSION)
                .map_err(StoreError::sqlite("prepare session upsert"))?;
            for session in sessions {
                statement
                    .execute((
                        session.id,
                        session.meeting_id,
                        session.name.as_str(),
                        session.session_type.as_str(),
                        timestamp_text(&session.start_time),
                        timestamp_text(&session.end_time),
                    ))
                    .map_err(StoreError::sqlite("upsert session"))?;
            }
            Ok(sessions.len())
        })
    }

    /// Insert or update drivers by number; the last write wins.
    pub fn upsert_drivers(&self, drivers: &[Driver]) -> Result<usize, StoreError> {
        self.in_transaction("upsert drivers", |tx| {
            let mut statement = tx
                .prepare_cached(UPSERT_DRIVER)
                .map_err(StoreError::sqlite("prepare driver upsert"))?;
            for driver in drivers {
                statement
                    .execute((
                        driver.number,
                        driver.full_name.as_str(),
                        driver.first_name.as_deref(),
                        driver.last_name.as_deref(),
                        driver.acronym.as_deref(),
                        driver.country_code.as_deref(),
                        driver.team_name.as_deref(),
                        driver.team_color.as_deref(),
                        driver.headshot_url.as_deref(),
                    ))
                    .map_err(StoreError::sqlite("upsert driver"))?;
            }
            Ok(drivers.len())
        })
    }

    /// Delete every row of one entity kind for one session.
    pub fn clear_session_scope(
        &self,
        scope: SessionScope,
        session: SessionId,
    ) -> Result<usize, StoreError> {
        self.in_transaction("clear session scope", |tx| clear_scope(tx, scope, session))
    }

    /// Append laps, updating any row that already exists for the same key.
    pub fn bulk_insert_laps(&self, laps: &[Lap]) -> Result<usize, StoreError> {
        self.in_transaction("insert laps", |tx| insert_laps(tx, laps))
    }

    /// Append pit stops, updating any row that already exists for the same key.
    pub fn bulk_insert_pit_stops(&self, stops: &[PitStop]) -> Result<usize, StoreError> {
        self.in_transaction("insert pit stops", |tx| insert_pit_stops(tx, stops))
    }

    /// Append classification rows, updating any existing row for the driver.
    pub fn bulk_insert_results(&self, results: &[SessionResult]) -> Result<usize, StoreError> {
        self.in_transaction("insert results", |tx| insert_results(tx, results))
    }

    /// Replace every lap of `session` with `laps` atomically.
    ///
    /// Rows belonging to another session are skipped with a warning.
    pub fn replace_session_laps(
        &self,
        session: SessionId,
        laps: &[Lap],
    ) -> Result<usize, StoreError> {
        let owned = scoped(session, laps, |lap| lap.session_id, "lap");
        self.in_transaction("replace session laps", |tx| {
            clear_scope(tx, SessionScope::Laps, session)?;
            insert_laps(tx, owned.iter().copied())
        })
    }

    /// Replace every pit stop of `session` with `stops` atomically.
    pub fn replace_session_pit_stops(
        &self,
        session: SessionId,
        stops: &[PitStop],
    ) -> Result<usize, StoreError> {
        let owned = scoped(session, stops, |stop| stop.session_id, "pit stop");
        self.in_transaction("replace session pit stops", |tx| {
            clear_scope(tx, SessionScope::PitStops, session)?;
            insert_pit_stops(tx, owned.iter().copied())
        })
    }

    /// Replace the classification of `session` with `results` atomically.
    pub fn replace_session_results(
        &self,
        session: SessionId,
        results: &[SessionResult],
    ) -> Result<usize, StoreError> {
        let owned = scoped(session, results, |result| result.session_id, "result");
        self.in_transaction("replace session results", |tx| {
            clear_scope(tx, SessionScope::Results, session)?;
            insert_results(tx, owned.iter().copied())
        })
    }

    /// Record the completion instant of a successful ingestion run.
    pub fn record_completion(&self, completed_at: DateTime<Utc>) -> Result<(), StoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                "INSERT INTO metadata (key, value) VALUES (?1, ?2)
                 ON CONFLICT (key) DO UPDATE SET value = excluded.value",
                (LAST_UPDATE_KEY, timestamp_text(&completed_at)),
            )
            .map(|_| ())
            .map_err(StoreError::sqlite("record completion"))
    }

    /// Delete the named sessions and every dependent row.
    ///
    /// Returns the number of sessions removed. Unknown ids are ignored.
    pub fn reset_sessions(&self, sessions: &[SessionId]) -> Result<usize, StoreError> {
        self.in_transaction("reset sessions", |tx| {
            let mut removed = 0;
            for session in sessions {
                for scope in [
                    SessionScope::Laps,
                    SessionScope::PitStops,
                    SessionScope::Results,
                ] {
                    clear_scope(tx, scope, *session)?;
                }
                removed += tx
                    .execute("DELETE FROM sessions WHERE session_key = ?1", [session])
                    .map_err(StoreError::sqlite("delete session"))?;
            }
            Ok(removed)
        })
    }

    pub(super) fn in_transaction<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut connection = self.lock()?;
        run_in_transaction(&mut connection, operation, work)
    }
}

fn run_in_transaction<T>(
    connection: &mut Connection,
    operation: &'static str,
    work: impl FnOnce(&Transaction<'_>) -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Sqlite { operation, source })?;
    let value = work(&transaction)?;
    transaction
        .commit()
        .map_err(|source| StoreError::Sqlite { operation, source })?;
    Ok(value)
}

fn scoped<'a, T>(
    session: SessionId,
    rows: &'a [T],
    key: impl Fn(&T) -> SessionId,
    kind: &'static str,
) -> Vec<&'a T> {
    let (owned, foreign): (Vec<&T>, Vec<&T>) =
        rows.iter().partition(|row| key(*row) == session);
    if !foreign.is_empty() {
        warn!(
            "skipping {} {kind} rows that do not belong to session {session}",
            foreign.len()
        );
    }
    owned
}

fn clear_scope(
    tx: &Transaction<'_>,
    scope: SessionScope,
    session: SessionId,
) -> Result<usize, StoreError> {
    tx.execute(scope.delete_sql(), [session])
        .map_err(StoreError::sqlite("clear session scope"))
}

fn insert_laps<'a>(
    tx: &Transaction<'_>,
    laps: impl IntoIterator<Item = &'a Lap>,
) -> Result<usize, StoreError> {
    let mut statement = tx
        .prepare_cached(INSERT_LAP)
        .map_err(StoreError::sqlite("prepare lap insert"))?;
    let mut written = 0;
    for lap in laps {
        statement
            .execute((
                lap.session_id,
                lap.driver_number,
                lap.lap_number,
                lap.lap_duration,
                lap.is_pit_out_lap,
                lap.stint,
                lap.tyre_compound.as_deref(),
                lap.position,
            ))
            .map_err(StoreError::sqlite("insert lap"))?;
        written += 1;
    }
    Ok(written)
}

fn insert_pit_stops<'a>(
    tx: &Transaction<'_>,
    stops: impl IntoIterator<Item = &'a PitStop>,
) -> Result<usize, StoreError> {
    let mut statement = tx
        .prepare_cached(INSERT_PIT_STOP)
        .map_err(StoreError::sqlite("prepare pit stop insert"))?;
    let mut written = 0;
    for stop in stops {
        statement
            .execute((
                stop.session_id,
                stop.driver_number,
                stop.stop_sequence,
                stop.lap_number,
                stop.duration,
            ))
            .map_err(StoreError::sqlite("insert pit stop"))?;
        written += 1;
    }
    Ok(written)
}

fn insert_results<'a>(
    tx: &Transaction<'_>,
    results: impl IntoIterator<Item = &'a SessionResult>,
) -> Result<usize, StoreError> {
    let mut statement = tx
        .prepare_cached(INSERT_RESULT)
        .map_err(StoreError::sqlite("prepare result insert"))?;
    let mut written = 0;
    for result in results {
        statement
            .execute((
                result.session_id,
                result.driver_number,
                result.position,
                result.laps_completed,
                result.dnf,
                result.dns,
                result.dsq,
            ))
            .map_err(StoreError::sqlite("insert result"))?;
        written += 1;
    }
    Ok(written)
}
