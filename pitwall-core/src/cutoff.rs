//! Completion cutoff used to decide which sessions are safe to ingest.
//!
//! A session is stored only when it has a known end strictly earlier than the
//! cutoff instant. The default cutoff is midnight UTC of the current day, so a
//! session still plausibly running today is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the cutoff instant is chosen for an ingestion run.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pitwall_core::CutoffPolicy;
///
/// let now = Utc.with_ymd_and_hms(2024, 9, 1, 15, 30, 0).unwrap();
/// let cutoff = CutoffPolicy::StartOfTodayUtc.resolve(now);
/// assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutoffPolicy {
    /// Midnight UTC at the start of the day the run begins.
    #[default]
    StartOfTodayUtc,
    /// A fixed instant, used for replays and tests.
    Fixed(DateTime<Utc>),
}

impl CutoffPolicy {
    /// Resolve the policy against the supplied clock reading.
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::StartOfTodayUtc => now
                .date_naive()
                .and_time(chrono::NaiveTime::MIN)
                .and_utc(),
            Self::Fixed(instant) => instant,
        }
    }
}

/// Returns `true` when a session with the given end is complete before
/// `cutoff`.
///
/// Sessions without an end time are never complete.
#[must_use]
pub fn is_complete_before(end_time: Option<DateTime<Utc>>, cutoff: DateTime<Utc>) -> bool {
    end_time.is_some_and(|end| end < cutoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, hour, minute, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    fn start_of_today_truncates_to_midnight() {
        assert_eq!(CutoffPolicy::StartOfTodayUtc.resolve(at(23, 59)), at(0, 0));
    }

    #[rstest]
    fn fixed_policy_ignores_clock() {
        let fixed = at(12, 0);
        assert_eq!(CutoffPolicy::Fixed(fixed).resolve(at(3, 0)), fixed);
    }

    #[rstest]
    #[case(Some(at(11, 59)), true)]
    #[case(Some(at(12, 0)), false)]
    #[case(Some(at(12, 1)), false)]
    #[case(None, false)]
    fn completion_is_strictly_before_cutoff(
        #[case] end: Option<DateTime<Utc>>,
        #[case] expected: bool,
    ) {
        assert_eq!(is_complete_before(end, at(12, 0)), expected);
    }
}
