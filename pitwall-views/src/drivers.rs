//! Driver listings and the lookup table shared by joined views.

use std::collections::HashMap;

use pitwall_core::{CareerLap, Driver, DriverNumber, SessionId, StoreError, TelemetryStore};
use serde::Serialize;

/// A driver with every stored lap across sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverCareer {
    /// Stored driver metadata.
    pub driver_info: Driver,
    /// Laps ordered newest meeting first, then newest session, then by lap.
    pub career_laps: Vec<CareerLap>,
}

/// Drivers keyed by car number.
pub(crate) fn driver_index(
    store: &TelemetryStore,
) -> Result<HashMap<DriverNumber, Driver>, StoreError> {
    Ok(store
        .drivers()?
        .into_iter()
        .map(|driver| (driver.number, driver))
        .collect())
}

/// Every stored driver, or only those with laps in `session`.
///
/// Ordered by team, then name.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn drivers(
    store: &TelemetryStore,
    session: Option<SessionId>,
) -> Result<Vec<Driver>, StoreError> {
    session.map_or_else(|| store.drivers(), |session| store.drivers_for_session(session))
}

/// Career overview of `number`, or `None` for an unknown driver.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn driver_career(
    store: &TelemetryStore,
    number: DriverNumber,
) -> Result<Option<DriverCareer>, StoreError> {
    let Some(driver_info) = store.driver(number)? else {
        return Ok(None);
    };
    let career_laps = store.laps_for_driver_career(number)?;
    Ok(Some(DriverCareer {
        driver_info,
        career_laps,
    }))
}
