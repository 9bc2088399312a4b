//! SSE Stream Example
//!
//! Subscribes to an SSE endpoint, prints every event, and reconnects after the
//! server closes the stream, honouring its `retry:` hint and resuming from the
//! last event id.
//!
//! Run with: `RUST_LOG=sse_client=debug cargo run -p sse-client --example sse_stream -- <url>`

use std::time::Duration;

use sse_client::{Session, SessionConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MAX_ATTEMPTS: usize = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080/events".to_string());

    let config = SessionConfig::new(url).connect_timeout(Duration::from_secs(10));
    let session = Session::builder(config)
        .on_event(|event| println!("[{}] {}", event.name, event.text()))
        .on_open(|response| info!(status = %response.status, "stream opened"))
        .on_close(|response| info!(opened = response.is_some(), "stream closed"))
        .build()?;

    for attempt in 1..=MAX_ATTEMPTS {
        if let Err(err) = session.listen().await {
            warn!(attempt, error = %err, "attempt failed");
        }

        let delay = session.retry_interval();
        info!(
            attempt,
            last_event_id = ?session.last_event_id(),
            delay = ?delay,
            "reconnecting"
        );
        tokio::time::sleep(delay).await;
    }

    Ok(())
}
