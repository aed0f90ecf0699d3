//! Normalised telemetry entities.
//!
//! Each type mirrors one stored table. Values are produced by the ingestion
//! pipeline from upstream records and read back by the query engine; nothing
//! here talks to the network or the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DriverNumber, MeetingId, SessionId};

/// A race weekend or event grouping several sessions at one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Upstream meeting key.
    pub id: MeetingId,
    /// Display name, for example "Italian Grand Prix".
    pub name: String,
    /// Upstream circuit key.
    pub circuit_id: Option<u32>,
    /// Short circuit name, for example "Monza".
    pub circuit_short_name: Option<String>,
    /// Town or city hosting the event.
    pub location: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Three-letter country code.
    pub country_code: Option<String>,
    /// Championship year.
    pub year: i32,
    /// Scheduled start of the meeting.
    pub start_time: DateTime<Utc>,
}

/// A discrete timed activity within a meeting.
///
/// Only completed sessions are stored, so `end_time` is always known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Upstream session key.
    pub id: SessionId,
    /// Owning meeting.
    pub meeting_id: MeetingId,
    /// Display name, for example "Sprint Qualifying".
    pub name: String,
    /// Session category, for example "Race" or "Practice".
    pub session_type: String,
    /// Start of the session.
    pub start_time: DateTime<Utc>,
    /// End of the session.
    pub end_time: DateTime<Utc>,
}

impl Session {
    /// Case-insensitive exact match on the session type.
    #[must_use]
    pub fn has_type(&self, session_type: &str) -> bool {
        self.session_type.eq_ignore_ascii_case(session_type.trim())
    }

    /// Whether the session is a grand prix or sprint race.
    #[must_use]
    pub fn is_race(&self) -> bool {
        self.has_type("Race")
    }
}

/// A competitor, keyed by permanent car number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    /// Car number.
    pub number: DriverNumber,
    /// Full display name.
    pub full_name: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Three-letter timing-screen acronym.
    pub acronym: Option<String>,
    /// Nationality code.
    pub country_code: Option<String>,
    /// Team at the time of the most recently ingested session.
    pub team_name: Option<String>,
    /// Team livery colour as a hex string without `#`.
    pub team_color: Option<String>,
    /// Portrait URL.
    pub headshot_url: Option<String>,
}

/// One lap driven by one driver in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    /// Session the lap belongs to.
    pub session_id: SessionId,
    /// Driver who completed the lap.
    pub driver_number: DriverNumber,
    /// 1-based lap number.
    pub lap_number: u32,
    /// Lap time in seconds; absent for incomplete or invalid laps.
    pub lap_duration: Option<f64>,
    /// Whether the lap started in the pit lane.
    pub is_pit_out_lap: bool,
    /// Stint the lap belongs to.
    pub stint: Option<u32>,
    /// Tyre compound fitted for the lap.
    pub tyre_compound: Option<String>,
    /// Track position at the end of the lap.
    pub position: Option<u32>,
}

impl Lap {
    /// Lap time usable for aggregation.
    ///
    /// Durations that are missing, non-finite or not strictly positive are
    /// treated as untimed.
    #[must_use]
    pub fn timed_duration(&self) -> Option<f64> {
        self.lap_duration
            .filter(|duration| duration.is_finite() && *duration > 0.0)
    }
}

/// Final classification entry for one driver in one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Classified session.
    pub session_id: SessionId,
    /// Classified driver.
    pub driver_number: DriverNumber,
    /// Reported finishing position, absent for some non-finishers.
    pub position: Option<u32>,
    /// Number of laps completed.
    pub laps_completed: u32,
    /// Did not finish.
    pub dnf: bool,
    /// Did not start.
    pub dns: bool,
    /// Disqualified.
    pub dsq: bool,
}

impl SessionResult {
    /// A driver counts as a finisher unless flagged DNF, DNS or DSQ.
    #[must_use]
    pub const fn is_finisher(&self) -> bool {
        !(self.dnf || self.dns || self.dsq)
    }
}

/// A pit stop made by one driver in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitStop {
    /// Session in which the stop happened.
    pub session_id: SessionId,
    /// Driver who stopped.
    pub driver_number: DriverNumber,
    /// 1-based ordinal of the stop for this driver, in lap order.
    pub stop_sequence: u32,
    /// Lap on which the driver entered the pit lane.
    pub lap_number: u32,
    /// Time spent in the pit lane, in seconds.
    pub duration: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lap(duration: Option<f64>) -> Lap {
        Lap {
            session_id: SessionId::new(1),
            driver_number: DriverNumber::new(44),
            lap_number: 3,
            lap_duration: duration,
            is_pit_out_lap: false,
            stint: None,
            tyre_compound: None,
            position: None,
        }
    }

    #[rstest]
    #[case(Some(90.5), Some(90.5))]
    #[case(None, None)]
    #[case(Some(0.0), None)]
    #[case(Some(-1.0), None)]
    #[case(Some(f64::NAN), None)]
    fn timed_duration_filters_unusable_values(
        #[case] raw: Option<f64>,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(lap(raw).timed_duration(), expected);
    }

    #[rstest]
    #[case(false, false, false, true)]
    #[case(true, false, false, false)]
    #[case(false, true, false, false)]
    #[case(false, false, true, false)]
    fn finisher_requires_no_status_flags(
        #[case] dnf: bool,
        #[case] dns: bool,
        #[case] dsq: bool,
        #[case] expected: bool,
    ) {
        let result = SessionResult {
            session_id: SessionId::new(1),
            driver_number: DriverNumber::new(1),
            position: Some(1),
            laps_completed: 57,
            dnf,
            dns,
            dsq,
        };
        assert_eq!(result.is_finisher(), expected);
    }

    #[rstest]
    #[case("race", true)]
    #[case(" Race ", true)]
    #[case("Qualifying", false)]
    fn session_type_matches_case_insensitively(#[case] filter: &str, #[case] expected: bool) {
        let session = Session {
            id: SessionId::new(9158),
            meeting_id: MeetingId::new(1219),
            name: "Race".into(),
            session_type: "Race".into(),
            start_time: DateTime::<Utc>::UNIX_EPOCH,
            end_time: DateTime::<Utc>::UNIX_EPOCH,
        };
        assert_eq!(session.has_type(filter), expected);
    }
}
