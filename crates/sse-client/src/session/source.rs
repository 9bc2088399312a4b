//! Stream sources: how a session obtains the byte stream it parses.
//!
//! The session only supplies a URL and the request header set; everything
//! about the transport (redirects, TLS, proxies) belongs to the
//! [`StreamSource`]. [`HttpStreamSource`] is the default, built on `reqwest`.

use std::{fmt, pin::Pin, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::TryStreamExt;
use tokio::time::timeout;

use super::{config::SessionConfig, types::ResponseMeta};
use crate::error::{SessionError, SessionResult};

/// Error type carried by a [`ByteStream`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Response body as a stream of byte chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// An opened stream: response metadata plus its body.
pub struct OpenedStream {
    /// Status and headers of the response.
    pub response: ResponseMeta,
    /// The event stream body.
    pub body: ByteStream,
}

impl OpenedStream {
    /// Bundle response metadata with any byte stream.
    pub fn new<S, E>(response: ResponseMeta, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            response,
            body: Box::pin(body.map_err(|e| -> BoxError { e.into() })),
        }
    }
}

impl fmt::Debug for OpenedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedStream")
            .field("response", &self.response)
            .finish_non_exhaustive()
    }
}

/// Opens the byte stream for one connection attempt.
///
/// `headers` is the complete request header set built by the session,
/// including `Accept: text/event-stream` and, when known, `Last-Event-ID`.
#[async_trait]
pub trait StreamSource: Send + Sync + 'static {
    /// Open the stream.
    ///
    /// # Errors
    ///
    /// Returns a connect error if the stream could not be established.
    async fn open(&self, url: &str, headers: http::HeaderMap) -> SessionResult<OpenedStream>;
}

/// [`StreamSource`] issuing a `GET` through `reqwest`.
///
/// Rejects non-2xx responses and, unless disabled in the config, responses
/// whose `Content-Type` is not `text/event-stream`.
#[derive(Clone, Debug)]
pub struct HttpStreamSource {
    client: reqwest::Client,
    connect_timeout: Duration,
    require_event_stream_content_type: bool,
}

impl HttpStreamSource {
    /// Build a source with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &SessionConfig) -> SessionResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| SessionError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config))
    }

    /// Build a source around an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: &SessionConfig) -> Self {
        Self {
            client,
            connect_timeout: config.connect_timeout,
            require_event_stream_content_type: config.require_event_stream_content_type,
        }
    }
}

#[async_trait]
impl StreamSource for HttpStreamSource {
    async fn open(&self, url: &str, headers: http::HeaderMap) -> SessionResult<OpenedStream> {
        let resp = timeout(
            self.connect_timeout,
            self.client.get(url).headers(headers).send(),
        )
        .await
        .map_err(|_| SessionError::timeout(self.connect_timeout))??;

        let status = resp.status();
        if !status.is_success() {
            return Err(SessionError::invalid_status(status));
        }

        let response = ResponseMeta::new(status, resp.headers().clone());
        if self.require_event_stream_content_type
            && let Some(ct) = response.headers.get(http::header::CONTENT_TYPE)
        {
            let ct_str = ct.to_str().unwrap_or("");
            if !ct_str.contains("text/event-stream") {
                return Err(SessionError::invalid_content_type(ct_str));
            }
        }

        Ok(OpenedStream::new(response, resp.bytes_stream()))
    }
}
