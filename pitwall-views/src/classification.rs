//! Final classification and multi-driver comparison.

use std::{cmp::Ordering, collections::HashMap};

use pitwall_core::{Driver, DriverNumber, SessionId, SessionResult, StoreError, TelemetryStore};
use serde::Serialize;

use crate::{drivers::driver_index, laps::fastest_per_driver};

/// How a driver's session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishStatus {
    /// Took the flag.
    Finished,
    /// Did not finish.
    Dnf,
    /// Did not start.
    Dns,
    /// Disqualified.
    Dsq,
}

impl FinishStatus {
    /// Status of a classification row; disqualification outranks the
    /// other flags.
    #[must_use]
    pub const fn of(result: &SessionResult) -> Self {
        if result.dsq {
            Self::Dsq
        } else if result.dns {
            Self::Dns
        } else if result.dnf {
            Self::Dnf
        } else {
            Self::Finished
        }
    }
}

/// One row of the displayed classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedEntry {
    /// Displayed position, a gap-free 1-based rank.
    pub position: u32,
    /// Position reported upstream, which may be missing or sparse.
    pub reported_position: Option<u32>,
    /// Classified driver.
    pub driver_number: DriverNumber,
    /// Laps completed.
    pub laps_completed: u32,
    /// How the session ended for the driver.
    pub status: FinishStatus,
    /// Stored driver metadata, if any.
    pub driver: Option<Driver>,
}

/// Final position of a compared driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "position", rename_all = "snake_case")]
pub enum Placement {
    /// Classified at the reported position.
    Classified(u32),
    /// No reported position.
    Unclassified,
}

/// Side-by-side summary of one driver in one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverComparison {
    /// Compared driver.
    pub driver_number: DriverNumber,
    /// Final position.
    pub position: Placement,
    /// Quickest timed lap, absent without any.
    pub fastest_lap: Option<f64>,
    /// Pit stops made.
    pub pit_stops: usize,
    /// Stored driver metadata, if any.
    pub driver: Option<Driver>,
}

fn classification_order(left: &SessionResult, right: &SessionResult) -> Ordering {
    right
        .is_finisher()
        .cmp(&left.is_finisher())
        .then_with(|| match (left.position, right.position) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| left.driver_number.cmp(&right.driver_number))
}

/// Sort results for display and pair each with its 1-based rank.
///
/// Finishers come first, then reported position ascending with missing
/// positions last, then car number.
#[must_use]
pub fn rank_results(mut results: Vec<SessionResult>) -> Vec<(u32, SessionResult)> {
    results.sort_by(classification_order);
    (1..).zip(results).collect()
}

/// Displayed classification of `session`.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn classification(
    store: &TelemetryStore,
    session: SessionId,
) -> Result<Vec<ClassifiedEntry>, StoreError> {
    let results = store.results_for_session(session)?;
    if results.is_empty() {
        return Ok(Vec::new());
    }
    let mut drivers = driver_index(store)?;
    Ok(rank_results(results)
        .into_iter()
        .map(|(position, result)| ClassifiedEntry {
            position,
            reported_position: result.position,
            driver_number: result.driver_number,
            laps_completed: result.laps_completed,
            status: FinishStatus::of(&result),
            driver: drivers.remove(&result.driver_number),
        })
        .collect())
}

/// Compare the requested drivers in `session`.
///
/// Duplicates in `requested` are dropped, keeping the first occurrence. A
/// driver missing from any source gets the neutral default for it.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn compare(
    store: &TelemetryStore,
    session: SessionId,
    requested: &[DriverNumber],
) -> Result<Vec<DriverComparison>, StoreError> {
    let mut wanted: Vec<DriverNumber> = Vec::with_capacity(requested.len());
    for driver in requested {
        if !wanted.contains(driver) {
            wanted.push(*driver);
        }
    }
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let positions: HashMap<DriverNumber, Option<u32>> = store
        .results_for_session(session)?
        .into_iter()
        .map(|result| (result.driver_number, result.position))
        .collect();
    let fastest: HashMap<DriverNumber, f64> = fastest_per_driver(&store.laps_for_session(session)?)
        .into_iter()
        .map(|(driver, _, duration)| (driver, duration))
        .collect();
    let mut stops: HashMap<DriverNumber, usize> = HashMap::new();
    for stop in store.pit_stops_for_session(session)? {
        *stops.entry(stop.driver_number).or_default() += 1;
    }
    let mut drivers = driver_index(store)?;

    Ok(wanted
        .into_iter()
        .map(|driver_number| DriverComparison {
            driver_number,
            position: positions
                .get(&driver_number)
                .copied()
                .flatten()
                .map_or(Placement::Unclassified, Placement::Classified),
            fastest_lap: fastest.get(&driver_number).copied(),
            pit_stops: stops.get(&driver_number).copied().unwrap_or_default(),
            driver: drivers.remove(&driver_number),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitwall_core::test_support::{driver, lap, meeting, pit_stop, result, session};
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    const RACE: u32 = 9472;

    #[fixture]
    fn store() -> TelemetryStore {
        let store = TelemetryStore::open_in_memory().expect("in-memory store");
        store
            .upsert_meetings(&[meeting(1229, "Bahrain Grand Prix", 0)])
            .expect("meeting");
        store
            .upsert_sessions(&[session(RACE, 1229, "Race", 2)])
            .expect("session");
        store
    }

    #[rstest]
    fn finishers_precede_retirements_with_dense_positions(store: TelemetryStore) {
        store
            .replace_session_results(
                SessionId::new(RACE),
                &[
                    result(RACE, 16, None, true),
                    result(RACE, 44, Some(7), false),
                    result(RACE, 1, Some(1), false),
                    result(RACE, 4, Some(19), true),
                    result(RACE, 63, None, false),
                ],
            )
            .expect("results");
        store
            .upsert_drivers(&[driver(1, "Max Verstappen", "Red Bull Racing")])
            .expect("driver");

        let entries = classification(&store, SessionId::new(RACE)).expect("view");

        let summary: Vec<_> = entries
            .iter()
            .map(|entry| (entry.position, entry.driver_number.get(), entry.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, 1, FinishStatus::Finished),
                (2, 44, FinishStatus::Finished),
                (3, 63, FinishStatus::Finished),
                (4, 4, FinishStatus::Dnf),
                (5, 16, FinishStatus::Dnf),
            ]
        );
        assert_eq!(entries.first().and_then(|e| e.reported_position), Some(1));
        assert!(entries.first().is_some_and(|e| e.driver.is_some()));
    }

    #[rstest]
    fn session_without_results_has_empty_classification(store: TelemetryStore) {
        assert!(
            classification(&store, SessionId::new(RACE))
                .expect("view")
                .is_empty()
        );
    }

    #[rstest]
    fn comparison_defaults_missing_sources(store: TelemetryStore) {
        store
            .replace_session_laps(SessionId::new(RACE), &[lap(RACE, 1, 1, Some(92.4))])
            .expect("laps");

        let rows = compare(
            &store,
            SessionId::new(RACE),
            &[DriverNumber::new(1), DriverNumber::new(2)],
        )
        .expect("comparison");

        assert_eq!(
            rows,
            vec![
                DriverComparison {
                    driver_number: DriverNumber::new(1),
                    position: Placement::Unclassified,
                    fastest_lap: Some(92.4),
                    pit_stops: 0,
                    driver: None,
                },
                DriverComparison {
                    driver_number: DriverNumber::new(2),
                    position: Placement::Unclassified,
                    fastest_lap: None,
                    pit_stops: 0,
                    driver: None,
                },
            ]
        );
    }

    #[rstest]
    fn comparison_merges_all_sources_in_request_order(store: TelemetryStore) {
        let race = SessionId::new(RACE);
        store
            .replace_session_laps(
                race,
                &[lap(RACE, 16, 1, Some(93.1)), lap(RACE, 16, 2, Some(92.7))],
            )
            .expect("laps");
        store
            .replace_session_results(race, &[result(RACE, 16, Some(2), false)])
            .expect("results");
        store
            .replace_session_pit_stops(race, &[pit_stop(RACE, 16, 1, 14), pit_stop(RACE, 16, 2, 35)])
            .expect("stops");

        let rows = compare(
            &store,
            race,
            &[DriverNumber::new(44), DriverNumber::new(16), DriverNumber::new(44)],
        )
        .expect("comparison");

        let summary: Vec<_> = rows
            .iter()
            .map(|row| (row.driver_number.get(), row.position, row.fastest_lap, row.pit_stops))
            .collect();
        assert_eq!(
            summary,
            vec![
                (44, Placement::Unclassified, None, 0),
                (16, Placement::Classified(2), Some(92.7), 2),
            ]
        );
    }

    fn arbitrary_result() -> impl Strategy<Value = SessionResult> {
        (1u32..100, proptest::option::of(1u32..30), any::<bool>(), any::<bool>())
            .prop_map(|(driver, position, dnf, dns)| SessionResult {
                dns,
                ..result(RACE, driver, position, dnf)
            })
    }

    proptest! {
        #[test]
        fn ranks_are_dense_and_finishers_lead(
            results in proptest::collection::vec(arbitrary_result(), 0..25)
        ) {
            let ranked = rank_results(results.clone());

            let ranks: Vec<u32> = ranked.iter().map(|(rank, _)| *rank).collect();
            let expected: Vec<u32> = (1..).take(results.len()).collect();
            prop_assert_eq!(ranks, expected);

            let first_non_finisher = ranked
                .iter()
                .position(|(_, result)| !result.is_finisher())
                .unwrap_or(ranked.len());
            prop_assert!(
                ranked
                    .iter()
                    .skip(first_non_finisher)
                    .all(|(_, result)| !result.is_finisher())
            );
        }
    }
}
