//! Incremental Server-Sent Events parser.
//!
//! Follows the framing of the
//! [HTML Living Standard](https://html.spec.whatwg.org/multipage/server-sent-events.html):
//! `field: value` lines, `:` comments, records closed by a blank line, and any
//! of `\n`, `\r` or `\r\n` as line terminator. The parser is permissive and
//! never fails; anything it cannot classify is treated as a comment.
//!
//! Output is reported either as a [`Stream`](futures_core::Stream) of
//! [`Frame`]s ([`EventStream`]) or pushed into a [`FrameSink`] ([`parse`]).

pub(crate) mod constants;
pub mod event;
pub mod event_stream;
pub(crate) mod parser;
pub mod sink;

pub use constants::DEFAULT_EVENT_NAME;
pub use event::{Event, Frame};
pub use event_stream::{Decoder, EventStream, parse};
pub use sink::{CallbackSink, FrameSink};
