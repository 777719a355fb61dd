//! Wire framing for the `data:`-line streaming protocol.
//!
//! The backend streams a chunked HTTP body of newline-terminated records:
//!
//! ```text
//! data: {"type":"token","content":"Once"}
//! data: {"type":"token","content":" upon"}
//! data: [DONE]
//! ```
//!
//! Chunk boundaries are arbitrary and may fall inside a record or inside a
//! multi-byte UTF-8 sequence, so decoding happens in two layers:
//! [`LineFramer`] reassembles complete lines from raw chunks, and
//! [`data_payload`] / [`parse_event`] classify each line. Only lines opening
//! with the six-character `data: ` prefix carry payloads; every other line
//! is protocol noise and is ignored.

use bytes::BytesMut;
use storywriter_core::StreamEvent;
use tracing::debug;

/// Record prefix. Exactly `data: ` with one trailing space; no other
/// spelling is recognized and lines are not trimmed before matching.
const DATA_PREFIX: &str = "data: ";

/// Payload marking normal end of stream. Checked before JSON parsing;
/// any bytes after it are left unread.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Reassembles newline-terminated lines from arbitrarily split byte chunks.
///
/// An unterminated trailing fragment is held until a later chunk completes
/// it. If the stream ends first, the fragment is discarded by dropping the
/// framer; there is no flush.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: BytesMut,
}

impl LineFramer {
    /// Create an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
        }
    }

    /// Absorb one chunk and return every line it completes, in order.
    ///
    /// Lines are split on `\n`; a trailing `\r` is stripped so CRLF bodies
    /// frame identically. A completed line that is not valid UTF-8 is
    /// dropped. Splitting on `\n` is safe for multi-byte sequences because
    /// `0x0A` never occurs as a UTF-8 continuation byte, so a partial
    /// sequence always stays in the buffer until its remainder arrives.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(line.len() - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            match std::str::from_utf8(&line) {
                Ok(text) => lines.push(text.to_owned()),
                Err(error) => {
                    debug!(%error, "dropping non-UTF-8 line");
                }
            }
        }
        lines
    }

    /// Length in bytes of the unterminated fragment currently buffered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Extract the payload of a record line.
///
/// Returns `None` for every line that does not start with the exact
/// `data: ` prefix: blank keep-alive lines, comment lines, `event:` or
/// other field lines, and near-miss spellings such as `data:` without the
/// space. The payload may still be the [`DONE_SENTINEL`] or malformed
/// JSON; callers classify it next.
#[must_use]
pub fn data_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Parse one record payload into a [`StreamEvent`].
///
/// A payload that is not a recognizable event is dropped and `None` is
/// returned; a bad record never fails the stream. Drops are logged at
/// debug, distinguishing well-formed JSON with an unrecognized shape from
/// payloads that are not JSON at all.
#[must_use]
pub fn parse_event(payload: &str) -> Option<StreamEvent> {
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(error) => {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(payload) {
                let tag = value
                    .get("type")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<missing>");
                debug!(%tag, %error, "dropping record with unrecognized shape");
            } else {
                debug!(%error, payload = %preview(payload), "dropping malformed record");
            }
            None
        }
    }
}

/// Truncate a payload for log output without splitting a UTF-8 boundary.
fn preview(payload: &str) -> &str {
    const MAX_CHARS: usize = 120;
    match payload.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => &payload[..idx],
        None => payload,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
