//! Error types.
//!
//! Application plumbing (config files, commands, the CLI) uses `anyhow` through the `Result` alias.
//! The routing and reporting core returns the typed `CoreError` so that callers can decide how to
//! degrade: keep the previous stop order, show a "no data" row, offer a retry, etc.

use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias for the routing and reporting core.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// The failures that the routing and reporting core can surface to its callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The distance or geocoding provider failed, timed out, or answered with malformed data.
    #[error("the location service is unavailable: {0}")]
    ServiceUnavailable(String),

    /// The geocoding provider had no address for the coordinate.
    #[error("no address was found for {0}")]
    GeocodeNotFound(String),

    /// A record timestamp could not be truncated to a calendar day.
    #[error("record '{id}' has an invalid timestamp '{value}'")]
    InvalidTimestamp { id: String, value: String },

    /// A coordinate was not a pair of finite numbers.
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    /// A stop string did not end with a numeric latitude and longitude.
    #[error("invalid stop '{0}'")]
    InvalidStop(String),

    /// A record from the store could not be understood.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The caller gave up on the request before it completed.
    #[error("the request was cancelled")]
    Cancelled,
}

impl CoreError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        CoreError::ServiceUnavailable(reason.into())
    }
}
