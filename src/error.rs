//! Error taxonomy shared across the crate.

use std::io;

use thiserror::Error;

/// Errors surfaced by initialization and the network write path.
///
/// Configuration and environment-resolution failures propagate to the
/// caller of [`try_init`](crate::try_init); write-path failures propagate
/// from the `try_*` logging methods once the retry budget is exhausted.
#[derive(Debug, Error)]
pub enum Error {
    /// No deployment environment indicator was provided.
    #[error("deployment environment is not set (define GRAYLOG_ENV)")]
    EnvUnset,

    /// The environment indicator did not name a known environment.
    #[error("unrecognized deployment environment {0:?}")]
    EnvUnparseable(String),

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The collector connection could not be established.
    #[error("failed to connect to log collector: {0}")]
    ConnectionFailed(#[source] io::Error),

    /// A record could not be encoded into a wire message.
    #[error("failed to encode log entry: {0}")]
    EncodeFailed(#[source] serde_json::Error),

    /// A message could not be delivered within the retry budget.
    #[error("send failed after {attempts} attempts: {source}")]
    SendFailed {
        attempts: usize,
        #[source]
        source: io::Error,
    },
}
