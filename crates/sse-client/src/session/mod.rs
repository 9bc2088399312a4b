//! Server-Sent Events (SSE) session.
//!
//! A [`Session`] performs one connection attempt per call, tracks
//! [`ConnectionStatus`], the last event id and the server's retry hint, and
//! forwards parsed events to the sink registered on its [`SessionBuilder`].
//!
//! # Architecture
//!
//! ```text
//! SessionBuilder::build(config)
//!   └─ Session ──► StreamSource::open(url, headers)   (HTTP by default)
//!        │                     │
//!        │                     └─ OpenedStream { response, body }
//!        │                                         │
//!        └── on_event ◄── FrameSink ◄── parse ◄────┘
//! ```
//!
//! Reconnection is left to the caller: call [`Session::listen`] again, and the
//! stored `Last-Event-ID` is sent so the server can resume.

pub mod config;
pub mod connection;
pub mod source;
pub mod types;

pub use config::{DEFAULT_RETRY_INTERVAL, DEFAULT_USER_AGENT, SessionConfig};
pub use connection::{CloseHook, EventHandler, OpenHook, Session, SessionBuilder};
pub use source::{BoxError, ByteStream, HttpStreamSource, OpenedStream, StreamSource};
pub use types::{ConnectionStatus, ResponseMeta};
