//! Source abstraction over the upstream telemetry API.

use std::fmt;

use async_trait::async_trait;
use pitwall_core::{MeetingId, SessionId};
use serde_json::Value;

use super::FetchError;

/// Resource kinds exposed by the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Race weekends.
    Meetings,
    /// Sessions within a meeting.
    Sessions,
    /// Driver metadata as published for one session.
    Drivers,
    /// Lap timing.
    Laps,
    /// Pit lane visits.
    Pit,
    /// Final classification.
    SessionResult,
    /// Tyre stints.
    Stints,
}

impl Resource {
    /// Path segment appended to the base URL.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Meetings => "meetings",
            Self::Sessions => "sessions",
            Self::Drivers => "drivers",
            Self::Laps => "laps",
            Self::Pit => "pit",
            Self::SessionResult => "session_result",
            Self::Stints => "stints",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Query filters applied to a resource request.
///
/// # Examples
///
/// ```
/// use pitwall_core::SessionId;
/// use pitwall_data::upstream::QueryParams;
///
/// let params = QueryParams::session(SessionId::new(9158));
/// assert_eq!(params.to_string(), "session_key=9158");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QueryParams {
    meeting: Option<MeetingId>,
    session: Option<SessionId>,
}

impl QueryParams {
    /// No filters.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            meeting: None,
            session: None,
        }
    }

    /// Filter by meeting key.
    #[must_use]
    pub const fn meeting(meeting: MeetingId) -> Self {
        Self {
            meeting: Some(meeting),
            session: None,
        }
    }

    /// Filter by session key.
    #[must_use]
    pub const fn session(session: SessionId) -> Self {
        Self {
            meeting: None,
            session: Some(session),
        }
    }

    /// Key-value pairs in the order they are sent.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let meeting = self.meeting.map(|id| ("meeting_key", id.to_string()));
        let session = self.session.map(|id| ("session_key", id.to_string()));
        meeting.into_iter().chain(session).collect()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return f.write_str("no filters");
        }
        let rendered: Vec<String> = pairs
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        f.write_str(&rendered.join("&"))
    }
}

/// Fetches ordered arrays of flat records from the upstream API.
///
/// Implementations must bound every call with a timeout and serialise calls
/// through their rate limiter; an empty array is a valid response.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Fetch every record of `resource` matching `params`.
    async fn fetch(&self, resource: Resource, params: QueryParams)
    -> Result<Vec<Value>, FetchError>;
}
