//! Read-only lookups, listings and counts.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Params, Row};
use serde::Serialize;

use super::{
    LAST_UPDATE_KEY, RowCounts, StoreError, TelemetryStore,
    columns::{count_value, parse_timestamp, timestamp_column},
};
use crate::{
    Driver, DriverNumber, Lap, Meeting, MeetingId, PitStop, Session, SessionId, SessionResult,
};

const MEETING_COLUMNS: &str = "meeting_key, meeting_name, circuit_key, circuit_short_name, \
     location, country_name, country_code, year, date_start";
const SESSION_COLUMNS: &str =
    "session_key, meeting_key, session_name, session_type, date_start, date_end";
const DRIVER_COLUMNS: &str = "d.driver_number, d.full_name, d.first_name, d.last_name, \
     d.name_acronym, d.country_code, d.team_name, d.team_colour, d.headshot_url";
const LAP_COLUMNS: &str = "session_key, driver_number, lap_number, lap_duration, \
     is_pit_out_lap, stint, tyre_compound, position";

/// Entity totals for one championship year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeasonCounts {
    /// Stored meetings in the year.
    pub meetings: u64,
    /// Stored sessions belonging to those meetings.
    pub sessions: u64,
    /// Distinct drivers with at least one lap in those sessions.
    pub drivers: u64,
}

/// One lap of a driver's career, joined with its session and meeting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerLap {
    /// The stored lap.
    #[serde(flatten)]
    pub lap: Lap,
    /// Name of the lap's session.
    pub session_name: String,
    /// Type of the lap's session.
    pub session_type: String,
    /// Name of the owning meeting.
    pub meeting_name: String,
    /// Championship year of the owning meeting.
    pub year: i32,
    /// Circuit of the owning meeting.
    pub circuit_short_name: Option<String>,
}

impl TelemetryStore {
    /// Look up a meeting by key.
    pub fn meeting(&self, id: MeetingId) -> Result<Option<Meeting>, StoreError> {
        self.query_optional(
            "find meeting",
            &format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE meeting_key = ?1"),
            [id],
            meeting_from_row,
        )
    }

    /// Look up a session by key.
    pub fn session(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        self.query_optional(
            "find session",
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_key = ?1"),
            [id],
            session_from_row,
        )
    }

    /// Look up a driver by car number.
    pub fn driver(&self, number: DriverNumber) -> Result<Option<Driver>, StoreError> {
        self.query_optional(
            "find driver",
            &format!("SELECT {DRIVER_COLUMNS} FROM drivers AS d WHERE d.driver_number = ?1"),
            [number],
            driver_from_row,
        )
    }

    /// All meetings, most recent first.
    pub fn meetings(&self) -> Result<Vec<Meeting>, StoreError> {
        self.query_all(
            "list meetings",
            &format!(
                "SELECT {MEETING_COLUMNS} FROM meetings ORDER BY date_start DESC, meeting_key DESC"
            ),
            [],
            meeting_from_row,
        )
    }

    /// Meetings of one championship year in calendar order.
    pub fn meetings_for_year(&self, year: i32) -> Result<Vec<Meeting>, StoreError> {
        self.query_all(
            "list meetings for year",
            &format!(
                "SELECT {MEETING_COLUMNS} FROM meetings WHERE year = ?1
                 ORDER BY date_start, meeting_key"
            ),
            [year],
            meeting_from_row,
        )
    }

    /// Sessions of one meeting in start order.
    pub fn sessions_for_meeting(&self, meeting: MeetingId) -> Result<Vec<Session>, StoreError> {
        self.query_all(
            "list sessions for meeting",
            &format!(
                "SELECT {SESSION_COLUMNS} FROM sessions WHERE meeting_key = ?1
                 ORDER BY date_start, session_key"
            ),
            [meeting],
            session_from_row,
        )
    }

    /// Every stored session in start order.
    pub fn sessions(&self) -> Result<Vec<Session>, StoreError> {
        self.query_all(
            "list sessions",
            &format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY date_start, session_key"),
            [],
            session_from_row,
        )
    }

    /// Laps of one session ordered by lap number then driver.
    pub fn laps_for_session(&self, session: SessionId) -> Result<Vec<Lap>, StoreError> {
        self.query_all(
            "list laps for session",
            &format!(
                "SELECT {LAP_COLUMNS} FROM laps WHERE session_key = ?1
                 ORDER BY lap_number, driver_number"
            ),
            [session],
            lap_from_row,
        )
    }

    /// Laps of one driver in one session ordered by lap number.
    pub fn laps_for_driver(
        &self,
        session: SessionId,
        driver: DriverNumber,
    ) -> Result<Vec<Lap>, StoreError> {
        self.query_all(
            "list laps for driver",
            &format!(
                "SELECT {LAP_COLUMNS} FROM laps WHERE session_key = ?1 AND driver_number = ?2
                 ORDER BY lap_number"
            ),
            (session, driver),
            lap_from_row,
        )
    }

    /// Every lap of `driver` across all sessions.
    ///
    /// Ordered newest meeting first, then newest session first, then by lap
    /// number.
    pub fn laps_for_driver_career(
        &self,
        driver: DriverNumber,
    ) -> Result<Vec<CareerLap>, StoreError> {
        self.query_all(
            "list career laps for driver",
            "SELECT l.session_key, l.driver_number, l.lap_number, l.lap_duration,
                    l.is_pit_out_lap, l.stint, l.tyre_compound, l.position,
                    s.session_name, s.session_type, m.meeting_name, m.year,
                    m.circuit_short_name
             FROM laps AS l
             JOIN sessions AS s ON s.session_key = l.session_key
             JOIN meetings AS m ON m.meeting_key = s.meeting_key
             WHERE l.driver_number = ?1
             ORDER BY m.date_start DESC, s.date_start DESC, l.session_key DESC, l.lap_number",
            [driver],
            |row| {
                Ok(CareerLap {
                    lap: lap_from_row(row)?,
                    session_name: row.get(8)?,
                    session_type: row.get(9)?,
                    meeting_name: row.get(10)?,
                    year: row.get(11)?,
                    circuit_short_name: row.get(12)?,
                })
            },
        )
    }

    /// Classification rows of one session ordered by driver number.
    pub fn results_for_session(&self, session: SessionId) -> Result<Vec<SessionResult>, StoreError> {
        self.query_all(
            "list results for session",
            "SELECT session_key, driver_number, position, laps_completed, dnf, dns, dsq
             FROM session_results WHERE session_key = ?1
             ORDER BY driver_number",
            [session],
            |row| {
                Ok(SessionResult {
                    session_id: row.get(0)?,
                    driver_number: row.get(1)?,
                    position: row.get(2)?,
                    laps_completed: row.get(3)?,
                    dnf: row.get(4)?,
                    dns: row.get(5)?,
                    dsq: row.get(6)?,
                })
            },
        )
    }

    /// Pit stops of one session ordered by driver then stop sequence.
    pub fn pit_stops_for_session(&self, session: SessionId) -> Result<Vec<PitStop>, StoreError> {
        self.query_all(
            "list pit stops for session",
            "SELECT session_key, driver_number, stop_sequence, lap_number, pit_duration
             FROM pit_stops WHERE session_key = ?1
             ORDER BY driver_number, stop_sequence",
            [session],
            |row| {
                Ok(PitStop {
                    session_id: row.get(0)?,
                    driver_number: row.get(1)?,
                    stop_sequence: row.get(2)?,
                    lap_number: row.get(3)?,
                    duration: row.get(4)?,
                })
            },
        )
    }

    /// Every known driver ordered by team then name.
    pub fn drivers(&self) -> Result<Vec<Driver>, StoreError> {
        self.query_all(
            "list drivers",
            &format!(
                "SELECT {DRIVER_COLUMNS} FROM drivers AS d
                 ORDER BY d.team_name, d.full_name, d.driver_number"
            ),
            [],
            driver_from_row,
        )
    }

    /// Drivers with at least one lap in `session`, ordered by team then name.
    pub fn drivers_for_session(&self, session: SessionId) -> Result<Vec<Driver>, StoreError> {
        self.query_all(
            "list drivers for session",
            &format!(
                "SELECT {DRIVER_COLUMNS} FROM drivers AS d
                 WHERE d.driver_number IN (
                     SELECT DISTINCT driver_number FROM laps WHERE session_key = ?1
                 )
                 ORDER BY d.team_name, d.full_name, d.driver_number"
            ),
            [session],
            driver_from_row,
        )
    }

    /// Championship years with at least one meeting, newest first.
    pub fn distinct_years(&self) -> Result<Vec<i32>, StoreError> {
        self.query_all(
            "list distinct years",
            "SELECT DISTINCT year FROM meetings ORDER BY year DESC",
            [],
            |row| row.get(0),
        )
    }

    /// Car numbers with at least one lap in `session`, ascending.
    ///
    /// Drivers without stored metadata are included.
    pub fn distinct_session_drivers(
        &self,
        session: SessionId,
    ) -> Result<Vec<DriverNumber>, StoreError> {
        self.query_all(
            "list distinct session drivers",
            "SELECT DISTINCT driver_number FROM laps WHERE session_key = ?1
             ORDER BY driver_number",
            [session],
            |row| row.get(0),
        )
    }

    /// Meeting, session and driver totals for one championship year.
    pub fn season_counts(&self, year: i32) -> Result<SeasonCounts, StoreError> {
        let connection = self.lock()?;
        let (meetings, sessions, drivers): (i64, i64, i64) = connection
            .query_row(
                "SELECT
                    (SELECT COUNT(*) FROM meetings WHERE year = ?1),
                    (SELECT COUNT(*) FROM sessions AS s
                        JOIN meetings AS m ON m.meeting_key = s.meeting_key
                        WHERE m.year = ?1),
                    (SELECT COUNT(DISTINCT l.driver_number) FROM laps AS l
                        JOIN sessions AS s ON s.session_key = l.session_key
                        JOIN meetings AS m ON m.meeting_key = s.meeting_key
                        WHERE m.year = ?1)",
                [year],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(StoreError::sqlite("count season"))?;
        Ok(SeasonCounts {
            meetings: count_value("meetings", meetings)?,
            sessions: count_value("sessions", sessions)?,
            drivers: count_value("drivers", drivers)?,
        })
    }

    /// Completion instant of the last successful ingestion run, if any.
    pub fn last_completion(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        let raw: Option<String> = {
            let connection = self.lock()?;
            connection
                .query_row(
                    "SELECT value FROM metadata WHERE key = ?1",
                    [LAST_UPDATE_KEY],
                    |row| row.get(0),
                )
                .optional()
                .map_err(StoreError::sqlite("read last completion"))?
        };
        raw.map(|value| parse_timestamp(LAST_UPDATE_KEY, &value))
            .transpose()
    }

    /// Row totals for every entity table.
    pub fn row_counts(&self) -> Result<RowCounts, StoreError> {
        let connection = self.lock()?;
        let raw: [i64; 6] = connection
            .query_row(
                "SELECT
                    (SELECT COUNT(*) FROM meetings),
                    (SELECT COUNT(*) FROM sessions),
                    (SELECT COUNT(*) FROM drivers),
                    (SELECT COUNT(*) FROM laps),
                    (SELECT COUNT(*) FROM pit_stops),
                    (SELECT COUNT(*) FROM session_results)",
                [],
                |row| {
                    Ok([
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ])
                },
            )
            .map_err(StoreError::sqlite("count rows"))?;
        let [meetings, sessions, drivers, laps, pit_stops, results] = raw;
        Ok(RowCounts {
            meetings: count_value("meetings", meetings)?,
            sessions: count_value("sessions", sessions)?,
            drivers: count_value("drivers", drivers)?,
            laps: count_value("laps", laps)?,
            pit_stops: count_value("pit_stops", pit_stops)?,
            results: count_value("session_results", results)?,
        })
    }

    fn query_all<T, P: Params>(
        &self,
        operation: &'static str,
        sql: &str,
        params: P,
        map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare_cached(sql)
            .map_err(StoreError::sqlite(operation))?;
        let rows = statement
            .query_map(params, map)
            .map_err(StoreError::sqlite(operation))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StoreError::sqlite(operation))
    }

    fn query_optional<T, P: Params>(
        &self,
        operation: &'static str,
        sql: &str,
        params: P,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>, StoreError> {
        let connection = self.lock()?;
        connection
            .query_row(sql, params, map)
            .optional()
            .map_err(StoreError::sqlite(operation))
    }
}

fn meeting_from_row(row: &Row<'_>) -> rusqlite::Result<Meeting> {
    Ok(Meeting {
        id: row.get(0)?,
        name: row.get(1)?,
        circuit_id: row.get(2)?,
        circuit_short_name: row.get(3)?,
        location: row.get(4)?,
        country: row.get(5)?,
        country_code: row.get(6)?,
        year: row.get(7)?,
        start_time: timestamp_column(row, 8, "meetings.date_start")?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        name: row.get(2)?,
        session_type: row.get(3)?,
        start_time: timestamp_column(row, 4, "sessions.date_start")?,
        end_time: timestamp_column(row, 5, "sessions.date_end")?,
    })
}

fn driver_from_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        number: row.get(0)?,
        full_name: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        acronym: row.get(4)?,
        country_code: row.get(5)?,
        team_name: row.get(6)?,
        team_color: row.get(7)?,
        headshot_url: row.get(8)?,
    })
}

fn lap_from_row(row: &Row<'_>) -> rusqlite::Result<Lap> {
    Ok(Lap {
        session_id: row.get(0)?,
        driver_number: row.get(1)?,
        lap_number: row.get(2)?,
        lap_duration: row.get(3)?,
        is_pit_out_lap: row.get(4)?,
        stint: row.get(5)?,
        tyre_compound: row.get(6)?,
        position: row.get(7)?,
    })
}
