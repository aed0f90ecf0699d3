//! Client for the upstream telemetry REST API.
//!
//! The API exposes one resource per entity kind (`meetings`, `sessions`,
//! `drivers`, `laps`, `pit`, `session_result`, `stints`), each returning a
//! JSON array of flat records filtered by `meeting_key` or `session_key`.
//!
//! [`UpstreamSource`] is the seam the ingestion pipeline depends on.
//! [`HttpUpstreamSource`] implements it over `reqwest`, applying a request
//! timeout and a minimum interval between calls shared by every caller of
//! one instance. Raw elements are turned into typed records with
//! [`decode_records`], which quarantines elements missing required keys.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use pitwall_core::MeetingId;
//! use pitwall_data::upstream::{
//!     HttpUpstreamSource, QueryParams, Resource, SessionRecord, UpstreamConfig,
//!     UpstreamSource, decode_records,
//! };
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UpstreamConfig::default().with_timeout(Duration::from_secs(10));
//! let source = HttpUpstreamSource::with_config(config)?;
//! let raw = source
//!     .fetch(Resource::Sessions, QueryParams::meeting(MeetingId::new(1219)))
//!     .await?;
//! let sessions = decode_records::<SessionRecord>(Resource::Sessions, raw);
//! println!("{} sessions", sessions.records.len());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod http;
mod rate;
mod records;
mod source;

#[doc(hidden)]
pub mod test_support;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MIN_INTERVAL_MS, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    UpstreamConfig,
};
pub use error::{FetchCause, FetchError};
pub use http::{ClientBuildError, HttpUpstreamSource};
pub use records::{
    Decoded, DriverRecord, LapRecord, MeetingRecord, PitRecord, SessionRecord,
    SessionResultRecord, StintRecord, decode_records,
};
pub use source::{QueryParams, Resource, UpstreamSource};
