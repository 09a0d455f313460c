//! Error types for the channel registry.
//!
//! All variants carry plain string context so the error can be cloned and
//! handed to every caller of a channel whose initialization failed. The
//! taxonomy distinguishes "no such channel" from "channel exists but failed
//! to connect" so callers can react differently (fix configuration vs.
//! retry infrastructure).

use crate::driver::Driver;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The requested channel name has no registered channel.
    #[error("channel not found: {name}")]
    ChannelNotFound { name: String },

    /// An engine section was present but failed to parse. Fatal to
    /// registry construction.
    #[error("invalid {driver} configuration for channel '{channel}': {message}")]
    Configuration {
        channel: String,
        driver: Driver,
        message: String,
    },

    /// Opening the connection handle failed. Cached as the channel's
    /// permanent outcome and returned to every caller.
    #[error("connection failed for channel '{channel}': {message}")]
    Connection { channel: String, message: String },

    /// A statement failed during execution. Surfaced per statement, never
    /// cached.
    #[error("query failed: {message}")]
    Query {
        message: String,
        /// e.g. "42P01" for undefined table
        code: Option<String>,
    },
}

impl ChannelError {
    /// Create a channel-not-found error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::ChannelNotFound { name: name.into() }
    }

    /// Create a configuration error for a channel's engine section.
    pub fn configuration(
        channel: impl Into<String>,
        driver: Driver,
        message: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            channel: channel.into(),
            driver,
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create a query error with an optional SQLSTATE code.
    pub fn query(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            code,
        }
    }

    /// Whether a caller-level retry could plausibly succeed. Connection
    /// failures are infrastructure issues; everything else needs a
    /// configuration or code fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

/// Convert statement-path sqlx errors. Connect-path errors are mapped by
/// the connector instead, which has the channel name for context.
impl From<sqlx::Error> for ChannelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                ChannelError::query(db_err.message(), code)
            }
            sqlx::Error::RowNotFound => ChannelError::query("no rows returned", None),
            other => ChannelError::query(other.to_string(), None),
        }
    }
}

/// Result type alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;
