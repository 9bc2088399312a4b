//! Core type definitions for SSE sessions.

use std::fmt;

/// Lifecycle of the current connection attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// An attempt has begun (or none has run yet).
    #[default]
    Waiting,
    /// The stream is open and being drained.
    Opened,
    /// The stream could not be opened.
    Closed,
}

impl ConnectionStatus {
    /// Returns `true` while an attempt is waiting for the stream to open.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` once the stream has been opened.
    pub fn is_opened(&self) -> bool {
        matches!(self, Self::Opened)
    }

    /// Returns `true` if the last attempt failed to open.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Opened => write!(f, "opened"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Response metadata handed to the lifecycle hooks.
#[derive(Clone, Debug)]
pub struct ResponseMeta {
    /// HTTP status of the stream response.
    pub status: http::StatusCode,
    /// Response headers.
    pub headers: http::HeaderMap,
}

impl ResponseMeta {
    /// Create response metadata.
    pub fn new(status: http::StatusCode, headers: http::HeaderMap) -> Self {
        Self { status, headers }
    }

    /// The response `Content-Type`, if present and printable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}
