//! Lap listings and the fastest-lap-per-driver view.

use std::{collections::HashMap, fmt, str::FromStr};

use pitwall_core::{Driver, DriverNumber, Lap, SessionId, StoreError, TelemetryStore};
use serde::Serialize;
use thiserror::Error;

use crate::drivers::driver_index;

/// Number of laps returned by [`LapsMode::FastestTopTen`].
pub const TOP_LAPS: usize = 10;

/// Best lap of one driver in one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FastestLap {
    /// Driver who set the lap.
    pub driver_number: DriverNumber,
    /// Lap on which the time was set.
    pub lap_number: u32,
    /// Lap time in seconds.
    pub lap_duration: f64,
    /// Stored driver metadata, if any.
    pub driver: Option<Driver>,
}

/// A lap joined with display fields of its driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapView {
    /// Stored lap.
    #[serde(flatten)]
    pub lap: Lap,
    /// Driver display name.
    pub full_name: Option<String>,
    /// Team colour hex.
    pub team_color: Option<String>,
}

/// Which laps [`session_laps`] returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LapsMode {
    /// Every lap in lap-number order.
    #[default]
    All,
    /// The ten quickest timed laps of the session.
    FastestTopTen,
}

/// Error returned when a laps mode string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown laps mode `{0}`; expected `all` or `fastest`")]
pub struct UnknownLapsMode(String);

impl FromStr for LapsMode {
    type Err = UnknownLapsMode;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "fastest" | "fastest_top_ten" | "top10" => Ok(Self::FastestTopTen),
            other => Err(UnknownLapsMode(other.to_owned())),
        }
    }
}

impl fmt::Display for LapsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::FastestTopTen => "fastest",
        })
    }
}

/// Pick each driver's quickest timed lap.
///
/// A tie inside one driver's laps goes to the lower lap number. The result
/// is ordered by duration, then lap number, then driver number, so equal
/// inputs always produce the same order.
#[must_use]
pub fn fastest_per_driver(laps: &[Lap]) -> Vec<(DriverNumber, u32, f64)> {
    let mut best: HashMap<DriverNumber, (u32, f64)> = HashMap::new();
    for lap in laps {
        let Some(duration) = lap.timed_duration() else {
            continue;
        };
        best.entry(lap.driver_number)
            .and_modify(|current| {
                let quicker = duration.total_cmp(&current.1).is_lt();
                let tied_earlier = duration.total_cmp(&current.1).is_eq() && lap.lap_number < current.0;
                if quicker || tied_earlier {
                    *current = (lap.lap_number, duration);
                }
            })
            .or_insert((lap.lap_number, duration));
    }

    let mut ranked: Vec<(DriverNumber, u32, f64)> = best
        .into_iter()
        .map(|(driver, (lap_number, duration))| (driver, lap_number, duration))
        .collect();
    ranked.sort_by(|left, right| {
        left.2
            .total_cmp(&right.2)
            .then(left.1.cmp(&right.1))
            .then(left.0.cmp(&right.0))
    });
    ranked
}

/// Fastest timed lap per driver in `session`, quickest first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn fastest_laps(
    store: &TelemetryStore,
    session: SessionId,
) -> Result<Vec<FastestLap>, StoreError> {
    let laps = store.laps_for_session(session)?;
    let ranked = fastest_per_driver(&laps);
    if ranked.is_empty() {
        return Ok(Vec::new());
    }
    let mut drivers = driver_index(store)?;
    Ok(ranked
        .into_iter()
        .map(|(driver_number, lap_number, lap_duration)| FastestLap {
            driver_number,
            lap_number,
            lap_duration,
            driver: drivers.remove(&driver_number),
        })
        .collect())
}

/// Laps of `session` joined with driver display fields.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn session_laps(
    store: &TelemetryStore,
    session: SessionId,
    mode: LapsMode,
) -> Result<Vec<LapView>, StoreError> {
    let mut laps = store.laps_for_session(session)?;
    if mode == LapsMode::FastestTopTen {
        laps.retain(|lap| lap.timed_duration().is_some());
        laps.sort_by(|left, right| {
            crate::stats::missing_last(left.timed_duration(), right.timed_duration())
                .then(left.lap_number.cmp(&right.lap_number))
                .then(left.driver_number.cmp(&right.driver_number))
        });
        laps.truncate(TOP_LAPS);
    }
    with_driver_fields(store, laps)
}

/// Laps of one driver in `session`, in lap order.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn driver_laps(
    store: &TelemetryStore,
    session: SessionId,
    driver: DriverNumber,
) -> Result<Vec<LapView>, StoreError> {
    let laps = store.laps_for_driver(session, driver)?;
    with_driver_fields(store, laps)
}

fn with_driver_fields(store: &TelemetryStore, laps: Vec<Lap>) -> Result<Vec<LapView>, StoreError> {
    if laps.is_empty() {
        return Ok(Vec::new());
    }
    let drivers = driver_index(store)?;
    Ok(laps
        .into_iter()
        .map(|lap| {
            let driver = drivers.get(&lap.driver_number);
            LapView {
                full_name: driver.map(|d| d.full_name.clone()),
                team_color: driver.and_then(|d| d.team_color.clone()),
                lap,
            }
        })
        .collect())
}
