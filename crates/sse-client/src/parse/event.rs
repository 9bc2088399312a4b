//! Representation of dispatched SSE events.

use core::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use super::constants::DEFAULT_EVENT_NAME;

/// A fully terminated SSE record.
///
/// Only produced once a record has at least one `data:` line and has been
/// closed by a blank line. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Stream-level id in effect when the record completed.
    pub id: Option<String>,
    /// Event name, `"message"` when the record had no `event:` field.
    pub name: String,
    /// One entry per `data:` line, in stream order.
    pub data: Vec<String>,
}

impl Event {
    /// Create an event, falling back to `"message"` for an empty name.
    pub fn new(id: Option<String>, name: impl Into<String>, data: Vec<String>) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name.push_str(DEFAULT_EVENT_NAME);
        }

        Self { id, name, data }
    }

    /// The data lines joined with `\n`.
    pub fn text(&self) -> String {
        self.data.join("\n")
    }

    /// Deserialize the joined data payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the payload is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.text())
    }
}

/// Everything the parser reports, in stream order.
///
/// `Retry` and `LastEventId` are emitted as soon as their line is read, so a
/// record's id always arrives before the record's own `Event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A completed record.
    Event(Event),
    /// A `retry:` field holding a valid number of milliseconds.
    Retry(Duration),
    /// An `id:` field (possibly empty).
    LastEventId(String),
}

/// Renders the event as a JSON object, or nothing if serialization fails.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => Ok(()),
        }
    }
}
