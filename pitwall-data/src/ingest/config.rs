//! Tuning knobs for an ingestion run.

use pitwall_core::CutoffPolicy;

/// Default number of meetings or sessions processed concurrently.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Configuration for [`Ingestor`](super::Ingestor).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pitwall_core::CutoffPolicy;
/// use pitwall_data::ingest::IngestConfig;
///
/// let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let config = IngestConfig::default()
///     .with_concurrency(0)
///     .with_cutoff(CutoffPolicy::Fixed(cutoff));
/// assert_eq!(config.concurrency(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    concurrency: usize,
    cutoff: CutoffPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            cutoff: CutoffPolicy::default(),
        }
    }
}

impl IngestConfig {
    /// Set how many units of work may be in flight at once.
    ///
    /// Values below one are raised to one.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the cutoff policy used to filter sessions.
    #[must_use]
    pub const fn with_cutoff(mut self, cutoff: CutoffPolicy) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Units of work allowed in flight at once.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Cutoff policy resolved at the start of each run.
    #[must_use]
    pub const fn cutoff(&self) -> CutoffPolicy {
        self.cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_to_four_workers_and_start_of_day() {
        let config = IngestConfig::default();
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.cutoff(), CutoffPolicy::StartOfTodayUtc);
    }

    #[rstest]
    #[case(0, 1)]
    #[case(1, 1)]
    #[case(8, 8)]
    fn concurrency_is_at_least_one(#[case] requested: usize, #[case] expected: usize) {
        let config = IngestConfig::default().with_concurrency(requested);
        assert_eq!(config.concurrency(), expected);
    }
}
