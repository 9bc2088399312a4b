//! # sse-client
//!
//! Server-Sent Events client: an incremental `text/event-stream` parser and a
//! reusable session that connects, tracks `Last-Event-ID` and the server's
//! retry hint, and delivers events to a registered sink.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sse_client::{Session, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::builder(SessionConfig::new("https://example.com/events"))
//!         .on_event(|event| println!("{}: {}", event.name, event.text()))
//!         .build()?;
//!
//!     // Runs until the server closes the stream.
//!     session.listen().await?;
//!     println!("retry after {:?}", session.retry_interval());
//!     Ok(())
//! }
//! ```
//!
//! The parser is usable on its own over any byte stream:
//!
//! ```rust
//! use futures_util::{StreamExt, stream};
//! use sse_client::parse::{EventStream, Frame};
//!
//! # tokio_test_block(async {
//! let body = stream::iter([Ok::<_, std::convert::Infallible>("data: hi\n\n")]);
//! let frames: Vec<Frame> = EventStream::new(body).collect().await;
//! assert!(matches!(&frames[..], [Frame::Event(event)] if event.text() == "hi"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

pub mod error;
pub mod parse;
pub mod session;

pub use error::{SessionError, SessionResult};
pub use parse::{Event, EventStream, Frame, FrameSink, parse};
pub use session::{
    ConnectionStatus, HttpStreamSource, ResponseMeta, Session, SessionBuilder, SessionConfig,
    StreamSource,
};
