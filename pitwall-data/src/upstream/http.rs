//! `reqwest`-backed [`UpstreamSource`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use super::{
    FetchCause, FetchError, QueryParams, Resource, UpstreamConfig, UpstreamSource,
    rate::RateLimiter,
};

/// Error raised when the HTTP client cannot be constructed.
#[derive(Debug, Error)]
#[error("failed to build HTTP client")]
pub struct ClientBuildError {
    #[source]
    source: reqwest::Error,
}

/// Upstream source speaking to the OpenF1 REST API.
///
/// One instance owns one connection pool and one rate limiter; share it
/// behind an `Arc` so every caller is throttled together.
///
/// # Examples
///
/// ```no_run
/// use pitwall_data::upstream::{HttpUpstreamSource, QueryParams, Resource, UpstreamSource};
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let source = HttpUpstreamSource::new("https://api.openf1.org/v1")?;
/// let meetings = source.fetch(Resource::Meetings, QueryParams::none()).await?;
/// println!("{} meetings", meetings.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct HttpUpstreamSource {
    client: Client,
    config: UpstreamConfig,
    limiter: RateLimiter,
}

impl HttpUpstreamSource {
    /// Create a source with default timeouts and rate limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientBuildError> {
        Self::with_config(UpstreamConfig::new(base_url))
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: UpstreamConfig) -> Result<Self, ClientBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|source| ClientBuildError { source })?;
        Ok(Self {
            client,
            limiter: RateLimiter::new(config.min_interval),
            config,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    fn resource_url(&self, resource: Resource) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            resource.path()
        )
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> FetchCause {
        if error.is_timeout() {
            return FetchCause::Timeout {
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchCause::Http {
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        if error.is_decode() {
            return FetchCause::Malformed {
                message: error.to_string(),
            };
        }

        FetchCause::Network {
            message: error.to_string(),
        }
    }

    async fn fetch_body(&self, resource: Resource, params: QueryParams) -> Result<Value, FetchCause> {
        self.limiter.acquire().await;
        let url = self.resource_url(resource);
        log::debug!("GET {url} ({params})");

        let response = self
            .client
            .get(&url)
            .query(&params.pairs())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err))?;

        response
            .json::<Value>()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))
    }
}

/// Unwrap a response body that must be a JSON array.
pub(crate) fn expect_array(body: Value) -> Result<Vec<Value>, FetchCause> {
    match body {
        Value::Array(records) => Ok(records),
        other => Err(FetchCause::Malformed {
            message: format!("expected a JSON array, found {}", json_kind(&other)),
        }),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl UpstreamSource for HttpUpstreamSource {
    async fn fetch(
        &self,
        resource: Resource,
        params: QueryParams,
    ) -> Result<Vec<Value>, FetchError> {
        self.fetch_body(resource, params)
            .await
            .and_then(expect_array)
            .map_err(|cause| FetchError::new(resource, params, cause))
    }
}
