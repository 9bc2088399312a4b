//! Line scanner for SSE streams.
//!
//! Works on raw bytes so that a multibyte character split across two reads
//! is only decoded once its whole line has arrived.

use bytes::{Buf, Bytes, BytesMut};

use super::constants::{COLON, CR, LF};

/// Field names recognised by the event builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldName {
    Event,
    Data,
    Id,
    Retry,
    Ignored,
}

impl FieldName {
    fn from_bytes(name: &[u8]) -> Self {
        match name {
            b"event" => Self::Event,
            b"data" => Self::Data,
            b"id" => Self::Id,
            b"retry" => Self::Retry,
            _ => Self::Ignored,
        }
    }
}

/// A single classified line, borrowing from the line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EventLine<'a> {
    /// Empty line (record terminator).
    Blank,
    /// Line starting with `:` or without any colon.
    Comment,
    /// `name:value` with the single optional leading space removed.
    Field {
        name: FieldName,
        value: &'a [u8],
    },
}

/// Finds the next end-of-line in `bytes`.
///
/// Returns `(line_end, remainder_start)`: the non-inclusive end of the line
/// and the inclusive start of the remainder. Returns `None` if more data is
/// needed, including a buffer that ends with a lone CR which could still be
/// the first half of a CRLF pair.
fn find_eol(bytes: &[u8]) -> Option<(usize, usize)> {
    let first_match = memchr::memchr2(CR, LF, bytes)?;

    match bytes[first_match] {
        LF => Some((first_match, first_match + 1)),
        _ => {
            if first_match + 1 >= bytes.len() {
                return None;
            }

            if bytes[first_match + 1] == LF {
                Some((first_match, first_match + 2))
            } else {
                Some((first_match, first_match + 1))
            }
        }
    }
}

/// Splits the next complete line off the front of `buffer`, dropping its
/// terminator.
///
/// Returns `None` (leaving `buffer` untouched) when no complete line is
/// buffered yet.
pub(crate) fn next_line(buffer: &mut BytesMut) -> Option<Bytes> {
    let (line_end, rem_start) = find_eol(buffer)?;

    let line = buffer.split_to(line_end).freeze();
    buffer.advance(rem_start - line_end);

    Some(line)
}

/// Classifies a line that has already been stripped of its terminator.
pub(crate) fn classify(line: &[u8]) -> EventLine<'_> {
    if line.is_empty() {
        return EventLine::Blank;
    }

    match memchr::memchr(COLON, line) {
        None | Some(0) => EventLine::Comment,
        Some(colon_pos) => {
            let value = &line[colon_pos + 1..];
            let value = match value {
                [b' ', rest @ ..] => rest,
                _ => value,
            };

            EventLine::Field {
                name: FieldName::from_bytes(&line[..colon_pos]),
                value,
            }
        }
    }
}
