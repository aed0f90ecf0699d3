//! Query boundary: raw string parameters in, typed views out.
//!
//! Every failure leaving this module is a [`QueryError`]. Bad parameters are
//! reported to the caller in full; store failures are logged here and
//! surfaced only as [`QueryError::Internal`].

use std::{error::Error as StdError, fmt, str::FromStr, sync::Arc};

use log::error;
use pitwall_core::{
    Driver, DriverNumber, Meeting, MeetingId, Session, SessionId, StoreError, TelemetryStore,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    ClassifiedEntry, DriverCareer, DriverComparison, FastestLap, LapView, LapsMode, MeetingDetails,
    SeasonSummary, TeamPace, TyreStint, classification, drivers, laps, pace, season,
};

/// Error returned by [`QueryService`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// A parameter was missing or malformed.
    #[error("invalid `{param}`: {reason}")]
    InvalidInput {
        /// Parameter name as supplied by the caller.
        param: &'static str,
        /// What was wrong with it.
        reason: String,
    },
    /// The query failed for a reason the caller cannot fix.
    #[error("the query could not be completed")]
    Internal,
}

/// Raw query parameters, as they arrive from a URL or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    /// `session_key`.
    pub session_key: Option<String>,
    /// `meeting_key`.
    pub meeting_key: Option<String>,
    /// `driver_number`.
    pub driver_number: Option<String>,
    /// `drivers`, a comma-separated list of car numbers.
    pub drivers: Option<String>,
    /// `session_type`.
    pub session_type: Option<String>,
    /// `year`.
    pub year: Option<String>,
    /// `mode`, see [`LapsMode`].
    pub mode: Option<String>,
}

/// Views answerable through [`QueryService::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// All meetings, newest first.
    Meetings,
    /// One meeting with sessions and winner.
    Meeting,
    /// Sessions of a meeting.
    Sessions,
    /// One session.
    Session,
    /// Laps of a session.
    Laps,
    /// Laps of one driver in a session.
    DriverLaps,
    /// Drivers, global or per session.
    Drivers,
    /// One driver.
    Driver,
    /// One driver's laps across every session.
    DriverCareer,
    /// Fastest lap per driver.
    FastestLaps,
    /// Team pace.
    TeamPace,
    /// Tyre stint analysis.
    TyreAnalysis,
    /// Final classification.
    Classification,
    /// Multi-driver comparison.
    Compare,
    /// Season summary.
    Season,
    /// Years with data.
    Years,
}

impl View {
    /// Every view, in help-text order.
    pub const ALL: [Self; 16] = [
        Self::Meetings,
        Self::Meeting,
        Self::Sessions,
        Self::Session,
        Self::Laps,
        Self::DriverLaps,
        Self::Drivers,
        Self::Driver,
        Self::DriverCareer,
        Self::FastestLaps,
        Self::TeamPace,
        Self::TyreAnalysis,
        Self::Classification,
        Self::Compare,
        Self::Season,
        Self::Years,
    ];

    /// Name used on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Meetings => "meetings",
            Self::Meeting => "meeting",
            Self::Sessions => "sessions",
            Self::Session => "session",
            Self::Laps => "laps",
            Self::DriverLaps => "driver-laps",
            Self::Drivers => "drivers",
            Self::Driver => "driver",
            Self::DriverCareer => "driver-career",
            Self::FastestLaps => "fastest-laps",
            Self::TeamPace => "team-pace",
            Self::TyreAnalysis => "tyre-analysis",
            Self::Classification => "classification",
            Self::Compare => "compare",
            Self::Season => "season",
            Self::Years => "years",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = QueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|view| view.name() == wanted)
            .ok_or_else(|| QueryError::InvalidInput {
                param: "view",
                reason: format!("unknown view `{raw}`"),
            })
    }
}

fn parse<T>(param: &'static str, raw: &str) -> Result<T, QueryError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|err: T::Err| QueryError::InvalidInput {
        param,
        reason: format!("`{raw}` is not valid: {err}"),
    })
}

fn optional<T>(param: &'static str, raw: Option<&str>) -> Result<Option<T>, QueryError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse(param, value))
        .transpose()
}

fn required<T>(param: &'static str, raw: Option<&str>) -> Result<T, QueryError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    optional(param, raw)?.ok_or_else(|| QueryError::InvalidInput {
        param,
        reason: "is required".to_owned(),
    })
}

fn driver_list(raw: Option<&str>) -> Result<Vec<DriverNumber>, QueryError> {
    let listed: Vec<DriverNumber> = required::<String>("drivers", raw)?
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse("drivers", item))
        .collect::<Result<_, _>>()?;
    if listed.is_empty() {
        return Err(QueryError::InvalidInput {
            param: "drivers",
            reason: "must name at least one driver".to_owned(),
        });
    }
    Ok(listed)
}

/// Read-only query front end over a shared [`TelemetryStore`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use pitwall_core::TelemetryStore;
/// use pitwall_views::{QueryArgs, QueryError, QueryService};
///
/// let store = Arc::new(TelemetryStore::open_in_memory().unwrap());
/// let service = QueryService::new(store);
///
/// let missing = service.fastest_laps(&QueryArgs::default());
/// assert!(matches!(missing, Err(QueryError::InvalidInput { param: "session_key", .. })));
///
/// let args = QueryArgs { session_key: Some("9158".into()), ..QueryArgs::default() };
/// assert!(service.fastest_laps(&args).unwrap().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct QueryService {
    store: Arc<TelemetryStore>,
}

impl QueryService {
    /// Create a service reading from `store`.
    #[must_use]
    pub const fn new(store: Arc<TelemetryStore>) -> Self {
        Self { store }
    }

    fn session_key(args: &QueryArgs) -> Result<SessionId, QueryError> {
        required("session_key", args.session_key.as_deref())
    }

    fn driver_number(args: &QueryArgs) -> Result<DriverNumber, QueryError> {
        required("driver_number", args.driver_number.as_deref())
    }

    /// All stored meetings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Internal`] if the store fails.
    pub fn meetings(&self) -> Result<Vec<Meeting>, QueryError> {
        guard(View::Meetings, self.store.meetings())
    }

    /// Meeting named by `meeting_key` with its sessions and winner.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn meeting(&self, args: &QueryArgs) -> Result<Option<MeetingDetails>, QueryError> {
        let meeting: MeetingId = required("meeting_key", args.meeting_key.as_deref())?;
        guard(View::Meeting, season::meeting_details(&self.store, meeting))
    }

    /// Sessions of `meeting_key`, optionally filtered by `session_type`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn sessions(&self, args: &QueryArgs) -> Result<Vec<Session>, QueryError> {
        let meeting: MeetingId = required("meeting_key", args.meeting_key.as_deref())?;
        let session_type = args
            .session_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        guard(
            View::Sessions,
            season::meeting_sessions(&self.store, meeting, session_type),
        )
    }

    /// Session named by `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn session(&self, args: &QueryArgs) -> Result<Option<Session>, QueryError> {
        let session = Self::session_key(args)?;
        guard(View::Session, self.store.session(session))
    }

    /// Laps of `session_key`; `mode=fastest` keeps the quickest ten.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing key or unknown mode.
    pub fn laps(&self, args: &QueryArgs) -> Result<Vec<LapView>, QueryError> {
        let session = Self::session_key(args)?;
        let mode: LapsMode = optional("mode", args.mode.as_deref())?.unwrap_or_default();
        guard(View::Laps, laps::session_laps(&self.store, session, mode))
    }

    /// Laps of `driver_number` in `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn driver_laps(&self, args: &QueryArgs) -> Result<Vec<LapView>, QueryError> {
        let session = Self::session_key(args)?;
        let driver = Self::driver_number(args)?;
        guard(
            View::DriverLaps,
            laps::driver_laps(&self.store, session, driver),
        )
    }

    /// All drivers, or those with laps in `session_key` when given.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a malformed key.
    pub fn drivers(&self, args: &QueryArgs) -> Result<Vec<Driver>, QueryError> {
        let session: Option<SessionId> = optional("session_key", args.session_key.as_deref())?;
        guard(View::Drivers, drivers::drivers(&self.store, session))
    }

    /// Driver named by `driver_number`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed number.
    pub fn driver(&self, args: &QueryArgs) -> Result<Option<Driver>, QueryError> {
        let driver = Self::driver_number(args)?;
        guard(View::Driver, self.store.driver(driver))
    }

    /// Career overview of `driver_number`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed number.
    pub fn driver_career(&self, args: &QueryArgs) -> Result<Option<DriverCareer>, QueryError> {
        let driver = Self::driver_number(args)?;
        guard(View::DriverCareer, drivers::driver_career(&self.store, driver))
    }

    /// Fastest lap per driver in `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn fastest_laps(&self, args: &QueryArgs) -> Result<Vec<FastestLap>, QueryError> {
        let session = Self::session_key(args)?;
        guard(View::FastestLaps, laps::fastest_laps(&self.store, session))
    }

    /// Team pace in `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn team_pace(&self, args: &QueryArgs) -> Result<Vec<TeamPace>, QueryError> {
        let session = Self::session_key(args)?;
        guard(View::TeamPace, pace::team_pace(&self.store, session))
    }

    /// Tyre stint analysis for `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn tyre_analysis(&self, args: &QueryArgs) -> Result<Vec<TyreStint>, QueryError> {
        let session = Self::session_key(args)?;
        guard(View::TyreAnalysis, pace::tyre_analysis(&self.store, session))
    }

    /// Final classification of `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed key.
    pub fn classification(&self, args: &QueryArgs) -> Result<Vec<ClassifiedEntry>, QueryError> {
        let session = Self::session_key(args)?;
        guard(
            View::Classification,
            classification::classification(&self.store, session),
        )
    }

    /// Comparison of `drivers` in `session_key`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing key or driver list.
    pub fn compare(&self, args: &QueryArgs) -> Result<Vec<DriverComparison>, QueryError> {
        let session = Self::session_key(args)?;
        let drivers = driver_list(args.drivers.as_deref())?;
        guard(
            View::Compare,
            classification::compare(&self.store, session, &drivers),
        )
    }

    /// Summary of `year`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidInput`] for a missing or malformed year.
    pub fn season(&self, args: &QueryArgs) -> Result<SeasonSummary, QueryError> {
        let year: i32 = required("year", args.year.as_deref())?;
        guard(View::Season, season::season_summary(&self.store, year))
    }

    /// Years with stored meetings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Internal`] if the store fails.
    pub fn years(&self) -> Result<Vec<i32>, QueryError> {
        guard(View::Years, season::available_years(&self.store))
    }

    /// Answer `view` and serialise the result as JSON.
    ///
    /// # Errors
    ///
    /// Returns the view's own error, or [`QueryError::Internal`] if the
    /// result cannot be serialised.
    pub fn run(&self, view: View, args: &QueryArgs) -> Result<Value, QueryError> {
        match view {
            View::Meetings => to_json(view, &self.meetings()?),
            View::Meeting => to_json(view, &self.meeting(args)?),
            View::Sessions => to_json(view, &self.sessions(args)?),
            View::Session => to_json(view, &self.session(args)?),
            View::Laps => to_json(view, &self.laps(args)?),
            View::DriverLaps => to_json(view, &self.driver_laps(args)?),
            View::Drivers => to_json(view, &self.drivers(args)?),
            View::Driver => to_json(view, &self.driver(args)?),
            View::DriverCareer => to_json(view, &self.driver_career(args)?),
            View::FastestLaps => to_json(view, &self.fastest_laps(args)?),
            View::TeamPace => to_json(view, &self.team_pace(args)?),
            View::TyreAnalysis => to_json(view, &self.tyre_analysis(args)?),
            View::Classification => to_json(view, &self.classification(args)?),
            View::Compare => to_json(view, &self.compare(args)?),
            View::Season => to_json(view, &self.season(args)?),
            View::Years => to_json(view, &self.years()?),
        }
    }
}

fn guard<T>(view: View, outcome: Result<T, StoreError>) -> Result<T, QueryError> {
    outcome.map_err(|err| {
        error!("query `{view}` failed: {err}; cause: {:?}", err.source());
        QueryError::Internal
    })
}

fn to_json<T: Serialize>(view: View, value: &T) -> Result<Value, QueryError> {
    serde_json::to_value(value).map_err(|err| {
        error!("serialising `{view}` failed: {err}");
        QueryError::Internal
    })
}
