//! Incremental SSE decoding.
//!
//! [`Decoder`] turns byte chunks into [`Frame`]s, [`EventStream`] adapts it to
//! a [`Stream`] of byte chunks, and [`parse`] drives a stream into a
//! [`FrameSink`].

use core::{
    fmt::Display,
    mem,
    pin::Pin,
    task::{Context, Poll, ready},
    time::Duration,
};

use bytes::{Buf, BufMut, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;
use tracing::debug;

use super::{
    constants::{BOM, CR, LF},
    event::{Event, Frame},
    parser::{EventLine, FieldName, classify, next_line},
    sink::FrameSink,
};

// ---------------------------------------------------------------------------
// EventBuilder
// ---------------------------------------------------------------------------

/// The record currently being assembled.
///
/// `id` is stream-level state and survives dispatch; `event` and `data` are
/// reset after every dispatched record.
#[derive(Debug, Default, Clone)]
struct EventBuilder {
    id: Option<String>,
    event: String,
    data: Vec<String>,
}

impl EventBuilder {
    fn apply(&mut self, line: EventLine<'_>) -> Option<Frame> {
        match line {
            EventLine::Blank => self.dispatch().map(Frame::Event),
            EventLine::Field {
                name: FieldName::Data,
                value,
            } => {
                self.data.push(decode(value));
                None
            }
            EventLine::Field {
                name: FieldName::Event,
                value,
            } => {
                self.event = decode(value);
                None
            }
            EventLine::Field {
                name: FieldName::Id,
                value,
            } => {
                let id = decode(value);
                self.id = (!id.is_empty()).then(|| id.clone());
                Some(Frame::LastEventId(id))
            }
            EventLine::Field {
                name: FieldName::Retry,
                value,
            } => parse_retry(value).map(Frame::Retry),
            // Comments and unknown fields are silently ignored.
            EventLine::Comment
            | EventLine::Field {
                name: FieldName::Ignored,
                ..
            } => None,
        }
    }

    /// A blank line with no buffered data leaves the record untouched.
    fn dispatch(&mut self) -> Option<Event> {
        if self.data.is_empty() {
            return None;
        }

        let name = mem::take(&mut self.event);
        let data = mem::take(&mut self.data);
        Some(Event::new(self.id.clone(), name, data))
    }
}

fn decode(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// `retry:` must be a base-10 number of milliseconds, optionally prefixed
/// with `+`. Negative values are ignored.
fn parse_retry(value: &[u8]) -> Option<Duration> {
    let digits = value.strip_prefix(b"+").unwrap_or(value);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }

    core::str::from_utf8(digits)
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Waiting for enough bytes to rule a BOM in or out.
    NotStarted,
    Started,
    /// No more input will arrive.
    Finished,
}

const fn starts_with_bom(buf: &[u8]) -> Option<bool> {
    match buf.len() {
        0 => None,
        1 => {
            if buf[0] == BOM[0] {
                None
            } else {
                Some(false)
            }
        }
        2 => {
            if buf[0] == BOM[0] && buf[1] == BOM[1] {
                None
            } else {
                Some(false)
            }
        }
        _gte_3 => Some(buf[0] == BOM[0] && buf[1] == BOM[1] && buf[2] == BOM[2]),
    }
}

/// Push-based SSE decoder.
///
/// Bytes are appended to a single buffer and complete lines are split off its
/// front as they are scanned, so each byte is examined once no matter how
/// large a record grows. Whatever follows the last complete line stays
/// buffered until the next [`feed`](Decoder::feed).
#[derive(Debug)]
pub struct Decoder {
    buffer: BytesMut,
    builder: EventBuilder,
    state: DecoderState,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            builder: EventBuilder::default(),
            state: DecoderState::NotStarted,
        }
    }

    /// Append a chunk read from the stream. Ignored after [`finish`](Decoder::finish).
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.state == DecoderState::Finished || chunk.is_empty() {
            return;
        }

        self.buffer.extend_from_slice(chunk);

        if self.state == DecoderState::NotStarted {
            match starts_with_bom(&self.buffer) {
                Some(true) => {
                    self.buffer.advance(BOM.len());
                    self.state = DecoderState::Started;
                }
                Some(false) => self.state = DecoderState::Started,
                None => {}
            }
        }
    }

    /// Mark the end of input.
    ///
    /// A trailing CR becomes a complete line end. Frames already buffered can
    /// still be drained with [`next_frame`](Decoder::next_frame); an
    /// unterminated record is never dispatched.
    pub fn finish(&mut self) {
        if self.state == DecoderState::Finished {
            return;
        }

        if self.buffer.last() == Some(&CR) {
            self.buffer.put_u8(LF);
        }
        self.state = DecoderState::Finished;
    }

    /// Next frame available from the buffered bytes, if any.
    pub fn next_frame(&mut self) -> Option<Frame> {
        if self.state == DecoderState::NotStarted {
            return None;
        }

        loop {
            let line = next_line(&mut self.buffer)?;
            if let Some(frame) = self.builder.apply(classify(&line)) {
                return Some(frame);
            }
        }
    }

    /// The id carried into the next dispatched event.
    pub fn last_event_id(&self) -> Option<&str> {
        self.builder.id.as_deref()
    }

    /// Number of bytes buffered but not yet scanned as complete lines.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }
}

// ---------------------------------------------------------------------------
// EventStream
// ---------------------------------------------------------------------------

pin_project_lite::pin_project! {
    /// A [`Stream`] that converts a stream of byte chunks into [`Frame`]s.
    ///
    /// The stream ends when the underlying stream ends or yields an error;
    /// read errors are logged and never surfaced as items.
    #[derive(Debug)]
    pub struct EventStream<S> {
        #[pin]
        stream: S,
        decoder: Decoder,
        terminated: bool,
    }
}

impl<S> EventStream<S> {
    /// Create a new [`EventStream`] from an underlying byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: Decoder::new(),
            terminated: false,
        }
    }

    /// The id carried into the next dispatched event.
    pub fn last_event_id(&self) -> Option<&str> {
        self.decoder.last_event_id()
    }
}

impl<S, B, E> Stream for EventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = Frame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(frame) = this.decoder.next_frame() {
                return Poll::Ready(Some(frame));
            }

            if *this.terminated {
                return Poll::Ready(None);
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.decoder.feed(chunk.as_ref()),
                Some(Err(err)) => {
                    debug!(error = %err, "SSE read failed, ending parse");
                    *this.terminated = true;
                    this.decoder.finish();
                }
                None => {
                    *this.terminated = true;
                    this.decoder.finish();
                }
            }
        }
    }
}

/// Read `stream` to exhaustion, handing every frame to `sink` in stream order.
///
/// Never fails: a read error simply ends the parse after whatever was already
/// buffered has been dispatched.
pub async fn parse<S, B, E, K>(stream: S, mut sink: K)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
    K: FrameSink,
{
    let mut frames = core::pin::pin!(EventStream::new(stream));
    while let Some(frame) = frames.next().await {
        sink.on_frame(frame);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
