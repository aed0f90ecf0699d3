//! Error types emitted by the Pitwall CLI.
//!
//! Keep this error type reasonably small, as every subcommand returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use pitwall_core::StoreError;
use pitwall_data::{IngestError, upstream::ClientBuildError};
use pitwall_views::QueryError;
use thiserror::Error;

/// Errors emitted by the Pitwall CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name without dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// An option was present but could not be interpreted.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Flag name without dashes.
        field: &'static str,
        /// What was wrong with the value.
        reason: String,
    },
    /// Installing the log subscriber failed.
    #[error("failed to initialise logging: {message}")]
    Logging {
        /// Subscriber error text.
        message: String,
    },
    /// Opening the database failed.
    #[error("failed to open database {path:?}: {source}")]
    OpenStore {
        /// Database file.
        path: Utf8PathBuf,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
    /// Reading or writing the database failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Building the HTTP client failed.
    #[error("failed to build upstream client for {base_url:?}: {source}")]
    BuildClient {
        /// Configured base URL.
        base_url: String,
        /// Underlying client error.
        #[source]
        source: ClientBuildError,
    },
    /// The async runtime could not be started.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The ingestion run aborted.
    #[error("ingestion failed: {0}")]
    Ingest(#[from] IngestError),
    /// The query was rejected or failed.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
