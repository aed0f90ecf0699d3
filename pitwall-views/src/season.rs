//! Meeting and season level views.

use pitwall_core::{
    Driver, DriverNumber, Meeting, MeetingId, SeasonCounts, Session, SessionId, StoreError,
    TelemetryStore,
};
use serde::Serialize;

use crate::classification::rank_results;

/// Winner of a meeting's race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceWinner {
    /// Race session the win was taken in.
    pub session_id: SessionId,
    /// Winning driver.
    pub driver_number: DriverNumber,
    /// Stored driver metadata, if any.
    pub driver: Option<Driver>,
}

/// A meeting with its sessions and race winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingDetails {
    /// The meeting.
    pub meeting: Meeting,
    /// Stored sessions, earliest first.
    pub sessions: Vec<Session>,
    /// Winner of the latest race session with a classified finisher.
    pub race_winner: Option<RaceWinner>,
}

/// Totals and meetings for one championship year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonSummary {
    /// Championship year.
    pub year: i32,
    /// Entity totals.
    pub counts: SeasonCounts,
    /// Meetings of the year, earliest first.
    pub meetings: Vec<Meeting>,
}

/// Sessions of `meeting`, optionally limited to one session type.
///
/// The type filter is a case-insensitive exact match.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn meeting_sessions(
    store: &TelemetryStore,
    meeting: MeetingId,
    session_type: Option<&str>,
) -> Result<Vec<Session>, StoreError> {
    let mut sessions = store.sessions_for_meeting(meeting)?;
    if let Some(session_type) = session_type {
        sessions.retain(|session| session.has_type(session_type));
    }
    Ok(sessions)
}

/// Meeting with its sessions and race winner, or `None` if unknown.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn meeting_details(
    store: &TelemetryStore,
    meeting: MeetingId,
) -> Result<Option<MeetingDetails>, StoreError> {
    let Some(found) = store.meeting(meeting)? else {
        return Ok(None);
    };
    let sessions = store.sessions_for_meeting(meeting)?;
    let race_winner = race_winner(store, &sessions)?;
    Ok(Some(MeetingDetails {
        meeting: found,
        sessions,
        race_winner,
    }))
}

fn race_winner(
    store: &TelemetryStore,
    sessions: &[Session],
) -> Result<Option<RaceWinner>, StoreError> {
    for race in sessions.iter().rev().filter(|session| session.is_race()) {
        let ranked = rank_results(store.results_for_session(race.id)?);
        let Some((_, winner)) = ranked.into_iter().next().filter(|(_, r)| r.is_finisher()) else {
            continue;
        };
        return Ok(Some(RaceWinner {
            session_id: race.id,
            driver_number: winner.driver_number,
            driver: store.driver(winner.driver_number)?,
        }));
    }
    Ok(None)
}

/// Counts and meetings for `year`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn season_summary(store: &TelemetryStore, year: i32) -> Result<SeasonSummary, StoreError> {
    Ok(SeasonSummary {
        year,
        counts: store.season_counts(year)?,
        meetings: store.meetings_for_year(year)?,
    })
}

/// Years with stored meetings, newest first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn available_years(store: &TelemetryStore) -> Result<Vec<i32>, StoreError> {
    store.distinct_years()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_core::test_support::{driver, lap, meeting, result, session};
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> TelemetryStore {
        let store = TelemetryStore::open_in_memory().expect("in-memory store");
        store
            .upsert_meetings(&[
                meeting(1229, "Bahrain Grand Prix", 0),
                meeting(1230, "Saudi Arabian Grand Prix", 7),
            ])
            .expect("meetings");
        store
            .upsert_sessions(&[
                session(9464, 1229, "Practice", 0),
                session(9465, 1229, "Qualifying", 1),
                session(9472, 1229, "Race", 2),
            ])
            .expect("sessions");
        store
            .upsert_drivers(&[driver(1, "Max Verstappen", "Red Bull Racing")])
            .expect("drivers");
        store
    }

    #[rstest]
    #[case(None, 3)]
    #[case(Some("race"), 1)]
    #[case(Some("QUALIFYING"), 1)]
    #[case(Some("Sprint"), 0)]
    fn sessions_filter_by_type(
        store: TelemetryStore,
        #[case] filter: Option<&str>,
        #[case] expected: usize,
    ) {
        let sessions = meeting_sessions(&store, MeetingId::new(1229), filter).expect("view");
        assert_eq!(sessions.len(), expected);
    }

    #[rstest]
    fn meeting_details_names_the_race_winner(store: TelemetryStore) {
        store
            .replace_session_results(
                SessionId::new(9472),
                &[result(9472, 11, Some(2), false), result(9472, 1, Some(1), false)],
            )
            .expect("results");

        let details = meeting_details(&store, MeetingId::new(1229))
            .expect("view")
            .expect("meeting exists");

        assert_eq!(details.sessions.len(), 3);
        let winner = details.race_winner.expect("race has a winner");
        assert_eq!(winner.driver_number, DriverNumber::new(1));
        assert_eq!(
            winner.driver.map(|d| d.full_name),
            Some("Max Verstappen".to_owned())
        );
    }

    #[rstest]
    fn meeting_without_results_has_no_winner(store: TelemetryStore) {
        let details = meeting_details(&store, MeetingId::new(1230))
            .expect("view")
            .expect("meeting exists");
        assert!(details.sessions.is_empty());
        assert_eq!(details.race_winner, None);
    }

    #[rstest]
    fn unknown_meeting_is_absent(store: TelemetryStore) {
        assert_eq!(meeting_details(&store, MeetingId::new(1)).expect("view"), None);
    }

    #[rstest]
    fn season_summary_counts_drivers_with_laps(store: TelemetryStore) {
        store
            .replace_session_laps(
                SessionId::new(9472),
                &[lap(9472, 1, 1, Some(95.0)), lap(9472, 11, 1, Some(96.0))],
            )
            .expect("laps");

        let summary = season_summary(&store, 2024).expect("view");

        assert_eq!(
            summary.counts,
            SeasonCounts {
                meetings: 2,
                sessions: 3,
                drivers: 2,
            }
        );
        assert_eq!(summary.meetings.len(), 2);
        assert_eq!(available_years(&store).expect("years"), vec![2024]);
    }
}
