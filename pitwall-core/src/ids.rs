//! Typed identifiers for upstream entities.
//!
//! The upstream API keys every entity with a small positive integer. Wrapping
//! each key in its own newtype keeps a session key from being passed where a
//! driver number is expected.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a textual identifier cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be a non-negative integer, got {value:?}")]
pub struct IdParseError {
    /// Human readable name of the identifier being parsed.
    pub kind: &'static str,
    /// Raw input that failed to parse.
    pub value: String,
    #[source]
    source: ParseIntError,
}

macro_rules! upstream_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw upstream key.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Return the raw upstream key.
            #[must_use]
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                value
                    .trim()
                    .parse::<u32>()
                    .map(Self)
                    .map_err(|source| IdParseError {
                        kind: $kind,
                        value: value.to_owned(),
                        source,
                    })
            }
        }
    };
}

upstream_id!(
    /// Upstream `meeting_key`.
    MeetingId,
    "meeting key"
);
upstream_id!(
    /// Upstream `session_key`.
    SessionId,
    "session key"
);
upstream_id!(
    /// Permanent car number, stable for a competitor within a season.
    DriverNumber,
    "driver number"
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("9158", 9158)]
    #[case(" 44 ", 44)]
    #[case("0", 0)]
    fn parses_numeric_keys(#[case] input: &str, #[case] expected: u32) {
        let id: SessionId = input.parse().expect("valid key");
        assert_eq!(id.get(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("-1")]
    #[case("1.5")]
    fn rejects_malformed_keys(#[case] input: &str) {
        let err = input.parse::<DriverNumber>().expect_err("should fail");
        assert_eq!(err.kind, "driver number");
        assert_eq!(err.value, input);
    }

    #[rstest]
    fn displays_raw_value() {
        assert_eq!(MeetingId::new(1219).to_string(), "1219");
    }
}
