//! Configuration for the HTTP upstream source.

use std::time::Duration;

/// Public OpenF1 endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openf1.org/v1";

/// Default user agent for upstream requests.
pub const DEFAULT_USER_AGENT: &str = "pitwall-ingest/0.1";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default minimum delay between two requests, in milliseconds.
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 250;

/// Configuration for [`HttpUpstreamSource`](super::HttpUpstreamSource).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use pitwall_data::upstream::UpstreamConfig;
///
/// let config = UpstreamConfig::new("http://localhost:8000/v1")
///     .with_timeout(Duration::from_secs(5))
///     .with_min_interval(Duration::from_millis(100));
/// assert_eq!(config.timeout, Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// Base URL, without a trailing resource segment.
    pub base_url: String,
    /// Connect and total timeout applied to every request.
    pub timeout: Duration,
    /// Minimum delay between the start of two consecutive requests.
    pub min_interval: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            min_interval: Duration::from_millis(DEFAULT_MIN_INTERVAL_MS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl UpstreamConfig {
    /// Create a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the minimum delay between requests.
    #[must_use]
    pub const fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_target_the_public_api() {
        let config = UpstreamConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.min_interval, Duration::from_millis(250));
    }

    #[rstest]
    fn builder_overrides_fields() {
        let config = UpstreamConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_min_interval(Duration::ZERO)
            .with_user_agent("test-agent/1.0");

        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.min_interval, Duration::ZERO);
        assert_eq!(config.user_agent, "test-agent/1.0");
    }
}
