//! Entity builders shared by unit and behaviour tests across the workspace.
//!
//! Values are deterministic: timestamps are derived from a fixed 2024 season
//! calendar so tests can compare whole structs.

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    Driver, DriverNumber, Lap, Meeting, MeetingId, PitStop, Session, SessionId, SessionResult,
};

/// Days from the Unix epoch to 2024-03-01, the first race weekend used here.
const SEASON_OPENER_DAYS: i64 = 19_783;

/// Midnight UTC `days` after the season opener, shifted by `hours`.
#[must_use]
pub fn season_day(days: i64, hours: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + TimeDelta::days(SEASON_OPENER_DAYS + days) + TimeDelta::hours(hours)
}

/// A 2024 meeting starting `days` after the season opener.
#[must_use]
pub fn meeting(id: u32, name: &str, days: i64) -> Meeting {
    Meeting {
        id: MeetingId::new(id),
        name: name.to_owned(),
        circuit_id: Some(id),
        circuit_short_name: Some(format!("Circuit {id}")),
        location: Some("Sakhir".to_owned()),
        country: Some("Bahrain".to_owned()),
        country_code: Some("BRN".to_owned()),
        year: 2024,
        start_time: season_day(days, 0),
    }
}

/// A completed session of `meeting` running from 13:00 to 15:00 UTC on
/// `days` after the season opener.
#[must_use]
pub fn session(id: u32, meeting: u32, session_type: &str, days: i64) -> Session {
    Session {
        id: SessionId::new(id),
        meeting_id: MeetingId::new(meeting),
        name: session_type.to_owned(),
        session_type: session_type.to_owned(),
        start_time: season_day(days, 13),
        end_time: season_day(days, 15),
    }
}

/// A driver with the given team and no optional portrait data.
#[must_use]
pub fn driver(number: u32, full_name: &str, team: &str) -> Driver {
    let mut names = full_name.split_whitespace();
    Driver {
        number: DriverNumber::new(number),
        full_name: full_name.to_owned(),
        first_name: names.next().map(str::to_owned),
        last_name: names.last().map(str::to_owned),
        acronym: None,
        country_code: None,
        team_name: Some(team.to_owned()),
        team_color: None,
        headshot_url: None,
    }
}

/// A lap with no stint, compound or position data.
#[must_use]
pub fn lap(session: u32, driver: u32, lap_number: u32, duration: Option<f64>) -> Lap {
    Lap {
        session_id: SessionId::new(session),
        driver_number: DriverNumber::new(driver),
        lap_number,
        lap_duration: duration,
        is_pit_out_lap: false,
        stint: None,
        tyre_compound: None,
        position: None,
    }
}

/// A lap on a given stint and compound.
#[must_use]
pub fn stint_lap(
    session: u32,
    driver: u32,
    lap_number: u32,
    duration: Option<f64>,
    stint: u32,
    compound: &str,
) -> Lap {
    Lap {
        stint: Some(stint),
        tyre_compound: Some(compound.to_owned()),
        ..lap(session, driver, lap_number, duration)
    }
}

/// A classification row without DNS or DSQ flags.
#[must_use]
pub fn result(session: u32, driver: u32, position: Option<u32>, dnf: bool) -> SessionResult {
    SessionResult {
        session_id: SessionId::new(session),
        driver_number: DriverNumber::new(driver),
        position,
        laps_completed: 57,
        dnf,
        dns: false,
        dsq: false,
    }
}

/// A pit stop lasting 22.5 seconds.
#[must_use]
pub fn pit_stop(session: u32, driver: u32, stop_sequence: u32, lap_number: u32) -> PitStop {
    PitStop {
        session_id: SessionId::new(session),
        driver_number: DriverNumber::new(driver),
        stop_sequence,
        lap_number,
        duration: Some(22.5),
    }
}
