//! Derived, read-only views over stored telemetry.
//!
//! Each view is a pure function of a [`pitwall_core::TelemetryStore`] and a
//! handful of typed parameters. [`QueryService`] wraps them behind a string
//! parameter boundary that validates input before touching the store.
//!
//! Ordering of every list is deterministic: ties are broken by lap number and
//! car number so equal inputs always render the same way.

#![forbid(unsafe_code)]

mod classification;
mod drivers;
mod laps;
mod pace;
mod season;
mod service;
mod stats;

pub use classification::{
    ClassifiedEntry, DriverComparison, FinishStatus, Placement, classification, compare,
    rank_results,
};
pub use drivers::{DriverCareer, driver_career, drivers};
pub use laps::{
    FastestLap, LapView, LapsMode, TOP_LAPS, UnknownLapsMode, driver_laps, fastest_laps,
    fastest_per_driver, session_laps,
};
pub use pace::{TeamPace, TyreStint, team_pace, tyre_analysis};
pub use season::{
    MeetingDetails, RaceWinner, SeasonSummary, available_years, meeting_details,
    meeting_sessions, season_summary,
};
pub use service::{QueryArgs, QueryError, QueryService, View};
