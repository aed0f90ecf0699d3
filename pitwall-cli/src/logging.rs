//! Log subscriber set-up for the binary.

use tracing_subscriber::EnvFilter;

use crate::CliError;

/// Filter applied when `RUST_LOG` is unset or unparsable.
const DEFAULT_FILTER: &str = "info";

/// Install a `fmt` subscriber writing to stderr.
///
/// Records emitted through the `log` facade by the library crates are
/// forwarded to the same subscriber.
///
/// # Errors
///
/// Returns [`CliError::Logging`] if a global subscriber is already set.
pub fn init_logging() -> Result<(), CliError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CliError::Logging {
            message: err.to_string(),
        })
}
