//! Conversion of decoded wire records into store entities.
//!
//! Every function here is pure. Duplicate natural keys within one response
//! collapse to the last record seen, so a batch handed to the store never
//! contains the same key twice.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use log::warn;
use pitwall_core::{
    Driver, DriverNumber, Lap, Meeting, MeetingId, PitStop, Session, SessionId, SessionResult,
    is_complete_before,
};

use crate::upstream::{
    DriverRecord, LapRecord, MeetingRecord, PitRecord, SessionRecord, SessionResultRecord,
    StintRecord,
};

/// Sessions split by the completion cutoff.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SessionFilter {
    pub(crate) retained: Vec<Session>,
    pub(crate) rejected: usize,
}

pub(crate) fn meetings(records: Vec<MeetingRecord>) -> Vec<Meeting> {
    let by_key: BTreeMap<MeetingId, Meeting> = records
        .into_iter()
        .map(|record| {
            let meeting = Meeting {
                id: record.meeting_key,
                name: record.meeting_name,
                circuit_id: record.circuit_key,
                circuit_short_name: record.circuit_short_name,
                location: record.location,
                country: record.country_name,
                country_code: record.country_code,
                year: record.year,
                start_time: record.date_start,
            };
            (meeting.id, meeting)
        })
        .collect();
    by_key.into_values().collect()
}

/// Keep sessions of `meeting` that ended strictly before `cutoff`.
///
/// Records naming another meeting are dropped with a warning; they would
/// otherwise attach to a meeting the store may not hold.
pub(crate) fn sessions(
    meeting: MeetingId,
    records: Vec<SessionRecord>,
    cutoff: DateTime<Utc>,
) -> SessionFilter {
    let mut retained = BTreeMap::new();
    let mut rejected = 0;
    for record in records {
        if record.meeting_key != meeting {
            warn!(
                "session {} reported under meeting {meeting} belongs to meeting {}",
                record.session_key, record.meeting_key
            );
            rejected += 1;
            continue;
        }
        let Some(end_time) = record
            .date_end
            .filter(|end| is_complete_before(Some(*end), cutoff))
        else {
            rejected += 1;
            continue;
        };
        retained.insert(
            record.session_key,
            Session {
                id: record.session_key,
                meeting_id: record.meeting_key,
                name: record.session_name,
                session_type: record.session_type,
                start_time: record.date_start,
                end_time,
            },
        );
    }
    SessionFilter {
        retained: retained.into_values().collect(),
        rejected,
    }
}

pub(crate) fn drivers(records: Vec<DriverRecord>) -> Vec<Driver> {
    let by_number: BTreeMap<DriverNumber, Driver> = records
        .into_iter()
        .map(|record| {
            let number = record.driver_number;
            let full_name = record
                .full_name
                .or(record.broadcast_name)
                .unwrap_or_else(|| format!("Driver {number}"));
            let driver = Driver {
                number,
                full_name,
                first_name: record.first_name,
                last_name: record.last_name,
                acronym: record.name_acronym,
                country_code: record.country_code,
                team_name: record.team_name,
                team_color: record.team_colour,
                headshot_url: record.headshot_url,
            };
            (number, driver)
        })
        .collect();
    by_number.into_values().collect()
}

/// Build the laps of `session`, filling stint and compound from `stints`.
///
/// Laps numbered zero or tagged with another session are dropped.
pub(crate) fn laps(session: SessionId, records: Vec<LapRecord>, stints: &[StintRecord]) -> Vec<Lap> {
    let mut by_key = BTreeMap::new();
    for record in records {
        if record.session_key != session {
            warn!(
                "dropping lap {} of driver {} from session {} returned for session {session}",
                record.lap_number, record.driver_number, record.session_key
            );
            continue;
        }
        if record.lap_number == 0 {
            warn!(
                "dropping lap 0 of driver {} in session {session}",
                record.driver_number
            );
            continue;
        }
        let stint = stint_for(stints, record.driver_number, record.lap_number);
        let lap = Lap {
            session_id: session,
            driver_number: record.driver_number,
            lap_number: record.lap_number,
            lap_duration: record.lap_duration,
            is_pit_out_lap: record.is_pit_out_lap.unwrap_or(false),
            stint: stint.map(|s| s.stint_number),
            tyre_compound: stint.and_then(|s| s.compound.clone()),
            position: record.position,
        };
        by_key.insert((lap.driver_number, lap.lap_number), lap);
    }
    by_key.into_values().collect()
}

fn stint_for(stints: &[StintRecord], driver: DriverNumber, lap_number: u32) -> Option<&StintRecord> {
    stints.iter().find(|stint| {
        stint.driver_number == driver
            && stint.lap_start.is_some_and(|start| start <= lap_number)
            && stint.lap_end.is_none_or(|end| lap_number <= end)
    })
}

/// Number each driver's stops 1, 2, ... in lap order.
pub(crate) fn pit_stops(session: SessionId, records: Vec<PitRecord>) -> Vec<PitStop> {
    let mut per_driver: BTreeMap<DriverNumber, Vec<PitRecord>> = BTreeMap::new();
    for record in records {
        if record.session_key != session {
            continue;
        }
        per_driver.entry(record.driver_number).or_default().push(record);
    }

    per_driver
        .into_values()
        .flat_map(|mut stops| {
            stops.sort_by_key(|stop| stop.lap_number);
            stops.into_iter().zip(1..).map(move |(stop, sequence)| PitStop {
                session_id: session,
                driver_number: stop.driver_number,
                stop_sequence: sequence,
                lap_number: stop.lap_number,
                duration: stop.pit_duration,
            })
        })
        .collect()
}

pub(crate) fn results(session: SessionId, records: Vec<SessionResultRecord>) -> Vec<SessionResult> {
    let by_driver: HashMap<DriverNumber, SessionResult> = records
        .into_iter()
        .filter(|record| record.session_key == session)
        .map(|record| {
            let result = SessionResult {
                session_id: session,
                driver_number: record.driver_number,
                position: record.position,
                laps_completed: record.number_of_laps.unwrap_or(0),
                dnf: record.dnf.unwrap_or(false),
                dns: record.dns.unwrap_or(false),
                dsq: record.dsq.unwrap_or(false),
            };
            (result.driver_number, result)
        })
        .collect();
    let mut results: Vec<SessionResult> = by_driver.into_values().collect();
    results.sort_by_key(|result| result.driver_number);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use pitwall_core::test_support::season_day;
    use rstest::{fixture, rstest};

    const RACE: SessionId = SessionId::new(500);

    fn session_record(id: u32, meeting: u32, end: Option<DateTime<Utc>>) -> SessionRecord {
        SessionRecord {
            session_key: SessionId::new(id),
            meeting_key: MeetingId::new(meeting),
            session_name: "Race".to_owned(),
            session_type: "Race".to_owned(),
            date_start: season_day(0, 13),
            date_end: end,
        }
    }

    fn lap_record(driver: u32, lap_number: u32, duration: Option<f64>) -> LapRecord {
        LapRecord {
            session_key: RACE,
            driver_number: DriverNumber::new(driver),
            lap_number,
            lap_duration: duration,
            is_pit_out_lap: None,
            position: None,
        }
    }

    fn stint(driver: u32, number: u32, laps: (Option<u32>, Option<u32>), compound: &str) -> StintRecord {
        StintRecord {
            session_key: RACE,
            driver_number: DriverNumber::new(driver),
            stint_number: number,
            lap_start: laps.0,
            lap_end: laps.1,
            compound: Some(compound.to_owned()),
        }
    }

    fn pit(driver: u32, lap_number: u32) -> PitRecord {
        PitRecord {
            session_key: RACE,
            driver_number: DriverNumber::new(driver),
            lap_number,
            pit_duration: Some(21.0),
        }
    }

    #[fixture]
    fn cutoff() -> DateTime<Utc> {
        season_day(1, 0)
    }

    #[rstest]
    fn sessions_must_end_strictly_before_the_cutoff(cutoff: DateTime<Utc>) {
        let records = vec![
            session_record(1, 10, Some(cutoff - TimeDelta::hours(2))),
            session_record(2, 10, Some(cutoff)),
            session_record(3, 10, None),
            session_record(4, 10, Some(cutoff + TimeDelta::hours(1))),
        ];

        let filter = sessions(MeetingId::new(10), records, cutoff);

        let ids: Vec<_> = filter.retained.iter().map(|s| s.id.get()).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(filter.rejected, 3);
    }

    #[rstest]
    fn sessions_of_other_meetings_are_rejected(cutoff: DateTime<Utc>) {
        let end = Some(cutoff - TimeDelta::hours(1));
        let records = vec![session_record(1, 10, end), session_record(2, 11, end)];

        let filter = sessions(MeetingId::new(10), records, cutoff);

        assert_eq!(filter.retained.len(), 1);
        assert_eq!(filter.rejected, 1);
    }

    #[rstest]
    fn driver_name_falls_back_to_broadcast_then_number() {
        let base = DriverRecord {
            driver_number: DriverNumber::new(44),
            full_name: None,
            broadcast_name: Some("L HAMILTON".to_owned()),
            first_name: None,
            last_name: None,
            name_acronym: None,
            country_code: None,
            team_name: None,
            team_colour: Some("27F4D2".to_owned()),
            headshot_url: None,
        };
        let anonymous = DriverRecord {
            driver_number: DriverNumber::new(99),
            broadcast_name: None,
            ..base.clone()
        };

        let drivers = drivers(vec![base, anonymous]);

        let names: Vec<_> = drivers.iter().map(|d| d.full_name.as_str()).collect();
        assert_eq!(names, vec!["L HAMILTON", "Driver 99"]);
        assert_eq!(
            drivers.first().and_then(|d| d.team_color.as_deref()),
            Some("27F4D2")
        );
    }

    #[rstest]
    fn duplicate_laps_keep_the_last_record() {
        let records = vec![
            lap_record(1, 1, Some(92.0)),
            lap_record(1, 1, Some(90.2)),
            lap_record(1, 0, Some(80.0)),
        ];

        let laps = laps(RACE, records, &[]);

        assert_eq!(laps.len(), 1);
        assert_eq!(laps.first().and_then(|lap| lap.lap_duration), Some(90.2));
    }

    #[rstest]
    fn laps_tagged_with_another_session_are_dropped() {
        let foreign = LapRecord {
            session_key: SessionId::new(501),
            ..lap_record(1, 2, Some(91.0))
        };

        let laps = laps(RACE, vec![lap_record(1, 1, Some(90.0)), foreign], &[]);

        let kept: Vec<_> = laps.iter().map(|lap| (lap.session_id, lap.lap_number)).collect();
        assert_eq!(kept, vec![(RACE, 1)]);
    }

    #[rstest]
    #[case(1, Some(1), Some("SOFT"))]
    #[case(12, Some(1), Some("SOFT"))]
    #[case(13, Some(2), Some("HARD"))]
    #[case(40, Some(2), Some("HARD"))]
    fn stints_fill_compound_by_lap_range(
        #[case] lap_number: u32,
        #[case] expected_stint: Option<u32>,
        #[case] expected_compound: Option<&str>,
    ) {
        let stints = vec![
            stint(1, 1, (Some(1), Some(12)), "SOFT"),
            stint(1, 2, (Some(13), None), "HARD"),
            stint(2, 1, (Some(1), Some(50)), "MEDIUM"),
        ];

        let laps = laps(RACE, vec![lap_record(1, lap_number, Some(90.0))], &stints);

        let lap = laps.first().expect("one lap");
        assert_eq!(lap.stint, expected_stint);
        assert_eq!(lap.tyre_compound.as_deref(), expected_compound);
    }

    #[rstest]
    fn pit_stops_are_sequenced_in_lap_order() {
        let records = vec![pit(1, 40), pit(16, 22), pit(1, 18)];

        let stops = pit_stops(RACE, records);

        let summary: Vec<_> = stops
            .iter()
            .map(|s| (s.driver_number.get(), s.stop_sequence, s.lap_number))
            .collect();
        assert_eq!(summary, vec![(1, 1, 18), (1, 2, 40), (16, 1, 22)]);
    }

    #[rstest]
    fn results_default_missing_flags_to_classified() {
        let records = vec![SessionResultRecord {
            session_key: RACE,
            driver_number: DriverNumber::new(1),
            position: Some(1),
            number_of_laps: None,
            dnf: None,
            dns: None,
            dsq: Some(false),
        }];

        let results = results(RACE, records);

        let result = results.first().expect("one result");
        assert!(result.is_finisher());
        assert_eq!(result.laps_completed, 0);
    }
}
