//! Errors raised by upstream sources.

use thiserror::Error;

use super::{QueryParams, Resource};

/// A failed upstream call, tagged with what was being fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("fetching {resource} ({params}) failed: {cause}")]
pub struct FetchError {
    /// Resource being fetched.
    pub resource: Resource,
    /// Filters sent with the request.
    pub params: QueryParams,
    /// What went wrong.
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    /// Tag `cause` with the request it belongs to.
    #[must_use]
    pub const fn new(resource: Resource, params: QueryParams, cause: FetchCause) -> Self {
        Self {
            resource,
            params,
            cause,
        }
    }
}

/// Reason an upstream call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FetchCause {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The server answered with a non-success status.
    #[error("upstream returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The connection failed before a response arrived.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },
    /// The body was not a JSON array.
    #[error("malformed response body: {message}")]
    Malformed {
        /// Error description.
        message: String,
    },
}
