//! SSE session configuration.

use std::time::Duration;

/// User agent sent when none is configured explicitly.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Reconnection delay assumed until the server sends a `retry:` field.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(3000);

/// Configuration for an SSE [`Session`](super::Session).
///
/// Provides sensible defaults and chainable setter methods.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// SSE endpoint URL.
    pub url: String,
    /// Additional HTTP headers to include with every connection attempt.
    pub headers: http::HeaderMap,
    /// `User-Agent` sent when `headers` does not already carry one.
    pub user_agent: Option<String>,
    /// How long to wait for the response headers.
    pub connect_timeout: Duration,
    /// Initial retry interval, replaced by the server's `retry:` field.
    pub retry_interval: Duration,
    /// Reject responses whose `Content-Type` is set to something other than
    /// `text/event-stream`.
    pub require_event_stream_content_type: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            headers: http::HeaderMap::new(),
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            connect_timeout: Duration::from_secs(10),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            require_event_stream_content_type: true,
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set additional HTTP headers (authorization, API keys, ...).
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add a single header.
    #[must_use]
    pub fn header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Set the `User-Agent`, or `None` to send none.
    #[must_use]
    pub fn user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the initial retry interval.
    #[must_use]
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Set whether the response content type is checked.
    #[must_use]
    pub fn require_event_stream_content_type(mut self, require: bool) -> Self {
        self.require_event_stream_content_type = require;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error message string if any field has an invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        let url = url::Url::parse(&self.url).map_err(|e| format!("Invalid URL: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("Unsupported URL scheme: {}", url.scheme()));
        }
        if self.connect_timeout.is_zero() {
            return Err("Connect timeout must be > 0".to_string());
        }
        if let Some(user_agent) = &self.user_agent
            && http::HeaderValue::from_str(user_agent).is_err()
        {
            return Err("User agent is not a valid header value".to_string());
        }
        Ok(())
    }
}
