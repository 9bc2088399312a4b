//! Error handling for SSE sessions.

use thiserror::Error;

/// The main result type used throughout the crate.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by [`Session`](crate::session::Session) entry points.
///
/// The parser itself never fails; only configuration problems and failures
/// to open the stream are reported.
#[derive(Error, Debug)]
pub enum SessionError {
    /// No event sink was registered before listening.
    #[error("The on_event sink is missing and it must be set")]
    MissingEventSink,

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// HTTP request errors (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("SSE connection rejected: status={status}")]
    InvalidStatus { status: http::StatusCode },

    /// The server answered with something other than an event stream.
    #[error("SSE connection rejected: content-type={content_type}")]
    InvalidContentType { content_type: String },

    /// Any other failure to open the stream.
    #[error("Connection error: {message}")]
    Connect { message: String },

    /// Timeout errors
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal errors (should not happen in normal operation)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SessionError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid-status error.
    pub fn invalid_status(status: http::StatusCode) -> Self {
        Self::InvalidStatus { status }
    }

    /// Create an invalid-content-type error.
    pub fn invalid_content_type(content_type: impl Into<String>) -> Self {
        Self::InvalidContentType {
            content_type: content_type.into(),
        }
    }

    /// Returns `true` for configuration errors raised before any network activity.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::MissingEventSink | Self::Config { .. })
    }

    /// Returns `true` if the stream could not be opened.
    pub fn is_connect_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::InvalidStatus { .. }
                | Self::InvalidContentType { .. }
                | Self::Connect { .. }
                | Self::Timeout { .. }
        )
    }
}
