//! Destinations for parser output.

use core::time::Duration;

use tokio::sync::mpsc;

use super::event::{Event, Frame};

/// Receives parser output in stream order.
///
/// Only [`on_event`](FrameSink::on_event) is mandatory; retry and
/// last-event-id notifications are dropped unless overridden.
pub trait FrameSink {
    /// Called once per completed record.
    fn on_event(&mut self, event: Event);

    /// Called for every `retry:` field that parsed as milliseconds.
    fn on_retry(&mut self, _retry: Duration) {}

    /// Called for every `id:` field, before the record it belongs to completes.
    fn on_last_event_id(&mut self, _id: &str) {}

    /// Route a [`Frame`] to the matching callback.
    fn on_frame(&mut self, frame: Frame) {
        match frame {
            Frame::Event(event) => self.on_event(event),
            Frame::Retry(retry) => self.on_retry(retry),
            Frame::LastEventId(id) => self.on_last_event_id(&id),
        }
    }
}

impl<K: FrameSink + ?Sized> FrameSink for &mut K {
    fn on_event(&mut self, event: Event) {
        (**self).on_event(event);
    }

    fn on_retry(&mut self, retry: Duration) {
        (**self).on_retry(retry);
    }

    fn on_last_event_id(&mut self, id: &str) {
        (**self).on_last_event_id(id);
    }

    fn on_frame(&mut self, frame: Frame) {
        (**self).on_frame(frame);
    }
}

/// Buffers events, ignoring side-channel notifications.
impl FrameSink for Vec<Event> {
    fn on_event(&mut self, event: Event) {
        self.push(event);
    }
}

/// Forwards every frame over a channel. Frames are dropped once the receiver
/// is gone.
impl FrameSink for mpsc::UnboundedSender<Frame> {
    fn on_event(&mut self, event: Event) {
        self.on_frame(Frame::Event(event));
    }

    fn on_retry(&mut self, retry: Duration) {
        self.on_frame(Frame::Retry(retry));
    }

    fn on_last_event_id(&mut self, id: &str) {
        self.on_frame(Frame::LastEventId(id.to_string()));
    }

    fn on_frame(&mut self, frame: Frame) {
        let _ = self.send(frame);
    }
}

type EventFn<'a> = Box<dyn FnMut(Event) + Send + 'a>;
type RetryFn<'a> = Box<dyn FnMut(Duration) + Send + 'a>;
type IdFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Closure-backed sink.
///
/// ```
/// use sse_client::parse::{CallbackSink, Event};
///
/// let mut names = Vec::new();
/// let mut retries = Vec::new();
/// let sink = CallbackSink::new(|event: Event| names.push(event.name))
///     .with_retry(|retry| retries.push(retry));
/// # drop(sink);
/// ```
pub struct CallbackSink<'a> {
    on_event: EventFn<'a>,
    on_retry: Option<RetryFn<'a>>,
    on_last_event_id: Option<IdFn<'a>>,
}

impl<'a> CallbackSink<'a> {
    /// Create a sink that forwards events to `on_event`.
    pub fn new(on_event: impl FnMut(Event) + Send + 'a) -> Self {
        Self {
            on_event: Box::new(on_event),
            on_retry: None,
            on_last_event_id: None,
        }
    }

    /// Also forward retry intervals.
    #[must_use]
    pub fn with_retry(mut self, on_retry: impl FnMut(Duration) + Send + 'a) -> Self {
        self.on_retry = Some(Box::new(on_retry));
        self
    }

    /// Also forward `id:` fields.
    #[must_use]
    pub fn with_last_event_id(mut self, on_last_event_id: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_last_event_id = Some(Box::new(on_last_event_id));
        self
    }
}

impl FrameSink for CallbackSink<'_> {
    fn on_event(&mut self, event: Event) {
        (self.on_event)(event);
    }

    fn on_retry(&mut self, retry: Duration) {
        if let Some(on_retry) = self.on_retry.as_mut() {
            on_retry(retry);
        }
    }

    fn on_last_event_id(&mut self, id: &str) {
        if let Some(on_last_event_id) = self.on_last_event_id.as_mut() {
            on_last_event_id(id);
        }
    }
}

impl core::fmt::Debug for CallbackSink<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackSink")
            .field("on_retry", &self.on_retry.is_some())
            .field("on_last_event_id", &self.on_last_event_id.is_some())
            .finish_non_exhaustive()
    }
}
