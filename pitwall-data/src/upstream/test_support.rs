//! Test utilities for upstream sources.
//!
//! [`StubSource`] answers from a table of canned responses keyed by
//! resource and filters, so ingestion can be exercised without a network.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use serde_json::Value;

use super::{FetchCause, FetchError, QueryParams, Resource, UpstreamSource};

#[derive(Debug, Clone)]
enum StubResponse {
    Records(Vec<Value>),
    Failure(FetchCause),
}

/// Deterministic in-memory [`UpstreamSource`].
///
/// Requests without a registered response return an empty array, matching
/// the upstream API for filters with no matches. Every request is recorded
/// so tests can assert on what was fetched.
///
/// # Example
///
/// ```
/// use pitwall_data::upstream::{QueryParams, Resource, UpstreamSource};
/// use pitwall_data::upstream::test_support::StubSource;
/// use serde_json::json;
///
/// let stub = StubSource::new()
///     .with_records(Resource::Meetings, QueryParams::none(), vec![json!({"meeting_key": 1})]);
///
/// let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let meetings = runtime
///     .block_on(stub.fetch(Resource::Meetings, QueryParams::none()))
///     .unwrap();
/// assert_eq!(meetings.len(), 1);
/// assert_eq!(stub.calls(), vec![(Resource::Meetings, QueryParams::none())]);
/// ```
#[derive(Debug, Default)]
pub struct StubSource {
    responses: HashMap<(Resource, QueryParams), StubResponse>,
    calls: Mutex<Vec<(Resource, QueryParams)>>,
}

impl StubSource {
    /// Create a stub with no registered responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `resource` with `params` using `records`.
    #[must_use]
    pub fn with_records(mut self, resource: Resource, params: QueryParams, records: Vec<Value>) -> Self {
        self.responses
            .insert((resource, params), StubResponse::Records(records));
        self
    }

    /// Fail `resource` with `params` using `cause`.
    #[must_use]
    pub fn with_failure(mut self, resource: Resource, params: QueryParams, cause: FetchCause) -> Self {
        self.responses
            .insert((resource, params), StubResponse::Failure(cause));
        self
    }

    /// Requests made so far, in the order they arrived.
    pub fn calls(&self) -> Vec<(Resource, QueryParams)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests made for `resource`.
    pub fn call_count(&self, resource: Resource) -> usize {
        self.calls()
            .iter()
            .filter(|(called, _)| *called == resource)
            .count()
    }
}

#[async_trait]
impl UpstreamSource for StubSource {
    async fn fetch(
        &self,
        resource: Resource,
        params: QueryParams,
    ) -> Result<Vec<Value>, FetchError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((resource, params));

        match self.responses.get(&(resource, params)) {
            Some(StubResponse::Records(records)) => Ok(records.clone()),
            Some(StubResponse::Failure(cause)) => {
                Err(FetchError::new(resource, params, cause.clone()))
            }
            None => Ok(Vec::new()),
        }
    }
}
