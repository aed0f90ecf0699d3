//! Aggregate pace views: per team and per tyre stint.

use std::collections::BTreeMap;

use log::warn;
use pitwall_core::{DriverNumber, SessionId, StoreError, TelemetryStore};
use serde::Serialize;

use crate::{
    drivers::driver_index,
    stats::{mean, minimum, missing_last},
};

/// Average pace of one team in one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPace {
    /// Team name.
    pub team_name: String,
    /// Team colour hex, taken from the first listed driver.
    pub team_color: Option<String>,
    /// Mean of timed laps, absent when the team set none.
    pub mean_lap_duration: Option<f64>,
    /// Laps driven by the team, timed or not.
    pub lap_count: usize,
    /// Drivers contributing laps, ascending.
    pub drivers: Vec<DriverNumber>,
}

/// Lap statistics for one compound on one stint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TyreStint {
    /// Tyre compound, if recorded.
    pub tyre_compound: Option<String>,
    /// Stint number, if recorded.
    pub stint: Option<u32>,
    /// Mean of timed laps.
    pub mean_lap_duration: Option<f64>,
    /// Quickest timed lap.
    pub fastest_lap_duration: Option<f64>,
    /// Laps in the group, timed or not.
    pub lap_count: usize,
}

#[derive(Default)]
struct Group {
    color: Option<String>,
    timed: Vec<f64>,
    laps: usize,
    drivers: Vec<DriverNumber>,
}

/// Team pace for `session`, quickest mean first.
///
/// Teams without any timed lap sort last. Laps whose driver has no stored
/// team are left out and logged.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn team_pace(store: &TelemetryStore, session: SessionId) -> Result<Vec<TeamPace>, StoreError> {
    let laps = store.laps_for_session(session)?;
    if laps.is_empty() {
        return Ok(Vec::new());
    }
    let drivers = driver_index(store)?;

    let mut teams: BTreeMap<String, Group> = BTreeMap::new();
    let mut unmatched: BTreeMap<DriverNumber, usize> = BTreeMap::new();
    for lap in &laps {
        let Some((team, driver)) = drivers
            .get(&lap.driver_number)
            .and_then(|driver| driver.team_name.as_ref().map(|team| (team, driver)))
        else {
            *unmatched.entry(lap.driver_number).or_default() += 1;
            continue;
        };
        let group = teams.entry(team.clone()).or_default();
        if group.color.is_none() {
            group.color.clone_from(&driver.team_color);
        }
        if !group.drivers.contains(&lap.driver_number) {
            group.drivers.push(lap.driver_number);
        }
        group.laps += 1;
        if let Some(duration) = lap.timed_duration() {
            group.timed.push(duration);
        }
    }
    for (driver, count) in unmatched {
        warn!("session {session}: {count} laps of driver {driver} have no team and were left out");
    }

    let mut pace: Vec<TeamPace> = teams
        .into_iter()
        .map(|(team_name, mut group)| {
            group.drivers.sort_unstable();
            TeamPace {
                team_name,
                team_color: group.color,
                mean_lap_duration: mean(&group.timed),
                lap_count: group.laps,
                drivers: group.drivers,
            }
        })
        .collect();
    pace.sort_by(|left, right| {
        missing_last(left.mean_lap_duration, right.mean_lap_duration)
            .then_with(|| left.team_name.cmp(&right.team_name))
    });
    Ok(pace)
}

/// Lap statistics grouped by stint and compound.
///
/// Ordered by stint, then compound, with unrecorded values first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn tyre_analysis(
    store: &TelemetryStore,
    session: SessionId,
) -> Result<Vec<TyreStint>, StoreError> {
    let mut groups: BTreeMap<(Option<u32>, Option<String>), (Vec<f64>, usize)> = BTreeMap::new();
    for lap in store.laps_for_session(session)? {
        let (timed, count) = groups.entry((lap.stint, lap.tyre_compound.clone())).or_default();
        *count += 1;
        if let Some(duration) = lap.timed_duration() {
            timed.push(duration);
        }
    }

    Ok(groups
        .into_iter()
        .map(|((stint, tyre_compound), (timed, lap_count))| TyreStint {
            tyre_compound,
            stint,
            mean_lap_duration: mean(&timed),
            fastest_lap_duration: minimum(&timed),
            lap_count,
        })
        .collect())
}
