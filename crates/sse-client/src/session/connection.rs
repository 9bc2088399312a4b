//! SSE session driver.
//!
//! A [`Session`] owns the connection status, the last event id and the retry
//! interval for one logical subscription. Each call to [`Session::listen`],
//! [`Session::listen_async`] or [`Session::collect`] runs one connection
//! attempt:
//!
//! ```text
//! acquire attempt permit ──► Waiting ──► StreamSource::open
//!                                          │ err ──► Closed, on_close(None), return error
//!                                          ▼ ok
//!                              Opened, on_open(response)
//!                                          │
//!                                    parse body ──► on_event / retry / last-event-id
//!                                          │
//!                              on_close(Some(response)), release permit
//! ```
//!
//! Only one attempt is in flight per session; a second caller waits for the
//! permit until the first attempt has run its close hook.

use std::{fmt, sync::Arc, time::Duration};

use parking_lot::RwLock;
use tokio::{
    sync::{OwnedSemaphorePermit, Semaphore},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use super::{
    config::SessionConfig,
    source::{ByteStream, HttpStreamSource, OpenedStream, StreamSource},
    types::{ConnectionStatus, ResponseMeta},
};
use crate::{
    error::{SessionError, SessionResult},
    parse::{Event, FrameSink, parse},
};

/// Receives every dispatched event.
pub type EventHandler = Arc<dyn Fn(Event) + Send + Sync>;
/// Called once the stream is open.
pub type OpenHook = Arc<dyn Fn(&ResponseMeta) + Send + Sync>;
/// Called when an attempt ends; `None` if the stream never opened.
pub type CloseHook = Arc<dyn Fn(Option<&ResponseMeta>) + Send + Sync>;

#[derive(Clone, Default)]
struct Hooks {
    on_event: Option<EventHandler>,
    on_open: Option<OpenHook>,
    on_close: Option<CloseHook>,
}

#[derive(Debug)]
struct SessionState {
    status: ConnectionStatus,
    last_event_id: Option<String>,
    retry_interval: Duration,
}

struct Inner<S> {
    config: SessionConfig,
    source: S,
    hooks: Hooks,
    state: RwLock<SessionState>,
    attempt_guard: Arc<Semaphore>,
}

/// An open stream together with the permit that keeps other attempts out.
struct Attempt {
    _permit: OwnedSemaphorePermit,
    response: ResponseMeta,
    body: ByteStream,
}

// ---------------------------------------------------------------------------
// SessionBuilder
// ---------------------------------------------------------------------------

/// Registers hooks and builds a [`Session`].
#[must_use]
pub struct SessionBuilder {
    config: SessionConfig,
    hooks: Hooks,
}

impl SessionBuilder {
    /// Start a builder from a configuration.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            hooks: Hooks::default(),
        }
    }

    /// Register the event sink. Required before listening.
    pub fn on_event(mut self, on_event: impl Fn(Event) + Send + Sync + 'static) -> Self {
        self.hooks.on_event = Some(Arc::new(on_event));
        self
    }

    /// Register a hook run when the stream opens.
    pub fn on_open(mut self, on_open: impl Fn(&ResponseMeta) + Send + Sync + 'static) -> Self {
        self.hooks.on_open = Some(Arc::new(on_open));
        self
    }

    /// Register a hook run when an attempt ends, including a failed open.
    pub fn on_close(
        mut self,
        on_close: impl Fn(Option<&ResponseMeta>) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.on_close = Some(Arc::new(on_close));
        self
    }

    /// Build a session that connects over HTTP.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config is invalid or the HTTP
    /// client cannot be built.
    pub fn build(self) -> SessionResult<Session> {
        self.config.validate().map_err(SessionError::config)?;
        let source = HttpStreamSource::new(&self.config)?;
        self.build_with_source(source)
    }

    /// Build a session that opens its streams through `source`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config is invalid.
    pub fn build_with_source<S: StreamSource>(self, source: S) -> SessionResult<Session<S>> {
        self.config.validate().map_err(SessionError::config)?;

        let state = SessionState {
            status: ConnectionStatus::Waiting,
            last_event_id: None,
            retry_interval: self.config.retry_interval,
        };

        Ok(Session {
            inner: Arc::new(Inner {
                config: self.config,
                source,
                hooks: self.hooks,
                state: RwLock::new(state),
                attempt_guard: Arc::new(Semaphore::new(1)),
            }),
        })
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("on_event", &self.hooks.on_event.is_some())
            .field("on_open", &self.hooks.on_open.is_some())
            .field("on_close", &self.hooks.on_close.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A reusable SSE subscription.
///
/// Cloning is cheap and every clone shares the same state and attempt permit.
/// The session never reconnects on its own: call one of the entry points
/// again to start the next attempt, which advertises the stored
/// `Last-Event-ID` to the server.
///
/// Status, last event id and retry interval are only written while an
/// attempt holds the permit. Readers see the latest written value, which may
/// already be stale by the time they act on it.
pub struct Session<S = HttpStreamSource> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Session<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Session {
    /// Start building a session for `config`.
    pub fn builder(config: SessionConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }
}

impl<S: StreamSource> Session<S> {
    /// The configuration the session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// The stream source used to open connections.
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Status of the current or most recent attempt.
    pub fn status(&self) -> ConnectionStatus {
        self.inner.state.read().status
    }

    /// Most recent non-empty `id:` seen on any attempt.
    pub fn last_event_id(&self) -> Option<String> {
        self.inner.state.read().last_event_id.clone()
    }

    /// Reconnection delay suggested by the server, or the configured default.
    pub fn retry_interval(&self) -> Duration {
        self.inner.state.read().retry_interval
    }

    /// Returns `true` while an attempt holds the permit.
    pub fn is_attempt_in_progress(&self) -> bool {
        self.inner.attempt_guard.available_permits() == 0
    }

    /// Run one attempt to completion and return every event it produced.
    ///
    /// The events go to the returned vector in place of the registered sink,
    /// which is not called for this attempt. A sink must still be registered.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingEventSink`] if no sink is registered,
    /// or the connect error if the stream could not be opened.
    pub async fn collect(&self) -> SessionResult<Vec<Event>> {
        self.event_handler()?;
        let attempt = self.open_attempt().await?;

        let mut events = Vec::new();
        self.drain(attempt, |event: Event| events.push(event)).await;

        Ok(events)
    }

    /// Run one attempt to completion, passing each event to the registered
    /// sink on this task as soon as it is parsed.
    ///
    /// The sink must not call back into this session's entry points: the
    /// permit is held while it runs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingEventSink`] if no sink is registered,
    /// or the connect error if the stream could not be opened.
    pub async fn listen(&self) -> SessionResult<()> {
        let on_event = self.event_handler()?;
        let attempt = self.open_attempt().await?;

        self.drain(attempt, move |event: Event| on_event(event)).await;
        Ok(())
    }

    /// Open the stream, then drain it on a spawned task.
    ///
    /// Returns once the stream is open, so connect errors are reported here.
    /// The returned handle completes after the close hook has run.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingEventSink`] if no sink is registered,
    /// or the connect error if the stream could not be opened.
    pub async fn listen_async(&self) -> SessionResult<JoinHandle<()>> {
        let on_event = self.event_handler()?;
        let attempt = self.open_attempt().await?;

        let session = self.clone();
        Ok(tokio::spawn(async move {
            session
                .drain(attempt, move |event: Event| on_event(event))
                .await;
        }))
    }

    fn event_handler(&self) -> SessionResult<EventHandler> {
        self.inner
            .hooks
            .on_event
            .clone()
            .ok_or(SessionError::MissingEventSink)
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.inner.state.write().status = status;
    }

    /// Header set for the next attempt.
    fn request_headers(&self) -> http::HeaderMap {
        let config = &self.inner.config;
        let mut headers = config.headers.clone();

        if let Some(user_agent) = &config.user_agent
            && !headers.contains_key(http::header::USER_AGENT)
            && let Ok(value) = http::HeaderValue::from_str(user_agent)
        {
            headers.insert(http::header::USER_AGENT, value);
        }
        headers.insert(
            http::header::ACCEPT,
            http::HeaderValue::from_static("text/event-stream"),
        );
        headers.insert(
            http::header::CACHE_CONTROL,
            http::HeaderValue::from_static("no-cache"),
        );

        // Last-Event-ID for resumption.
        if let Some(id) = self.last_event_id() {
            match http::HeaderValue::from_str(&id) {
                Ok(value) => {
                    headers.insert(
                        http::header::HeaderName::from_static("last-event-id"),
                        value,
                    );
                }
                Err(_) => warn!(id = %id, "Last event id is not a valid header value, not sent"),
            }
        }

        headers
    }

    async fn open_attempt(&self) -> SessionResult<Attempt> {
        let permit = Arc::clone(&self.inner.attempt_guard)
            .acquire_owned()
            .await
            .map_err(|_| SessionError::internal("attempt guard closed"))?;

        self.set_status(ConnectionStatus::Waiting);
        let url = &self.inner.config.url;
        let headers = self.request_headers();
        info!(url = %url, last_event_id = ?self.last_event_id(), "SSE connecting");

        match self.inner.source.open(url, headers).await {
            Ok(OpenedStream { response, body }) => {
                info!(url = %url, status = %response.status, "SSE connection established");
                self.set_status(ConnectionStatus::Opened);
                if let Some(on_open) = &self.inner.hooks.on_open {
                    on_open(&response);
                }

                Ok(Attempt {
                    _permit: permit,
                    response,
                    body,
                })
            }
            Err(err) => {
                error!(url = %url, error = %err, "SSE connection failed");
                self.set_status(ConnectionStatus::Closed);
                if let Some(on_close) = &self.inner.hooks.on_close {
                    on_close(None);
                }
                Err(err)
            }
        }
    }

    async fn drain<F: FnMut(Event)>(&self, attempt: Attempt, dispatch: F) {
        let Attempt {
            _permit,
            response,
            body,
        } = attempt;

        parse(
            body,
            AttemptSink {
                state: &self.inner.state,
                dispatch,
            },
        )
        .await;

        info!(url = %self.inner.config.url, "SSE stream ended");
        if let Some(on_close) = &self.inner.hooks.on_close {
            on_close(Some(&response));
        }
    }
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

/// Wires parser output into the session state for one attempt.
struct AttemptSink<'a, F> {
    state: &'a RwLock<SessionState>,
    dispatch: F,
}

impl<F: FnMut(Event)> FrameSink for AttemptSink<'_, F> {
    fn on_event(&mut self, event: Event) {
        debug!(name = %event.name, id = ?event.id, "SSE event received");
        (self.dispatch)(event);
    }

    fn on_retry(&mut self, retry: Duration) {
        debug!(retry = ?retry, "SSE retry interval updated");
        self.state.write().retry_interval = retry;
    }

    fn on_last_event_id(&mut self, id: &str) {
        if id.is_empty() {
            return;
        }
        debug!(id = %id, "SSE last event id updated");
        self.state.write().last_event_id = Some(id.to_string());
    }
}
