//! Stream events for the generation protocol.
//!
//! [`StreamEvent`] is the unit the streaming consumer yields: one event per
//! `data: <json>` record on the wire, discriminated by the `type` field.
//! Events are transient: they drive live display updates during a turn and
//! are never persisted; the durable results arrive with the `complete`
//! event.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::story::{BibleEntry, Choice, StoryEvent};

// ─────────────────────────────────────────────────────────────────────────────
// StreamEvent: generation stream records
// ─────────────────────────────────────────────────────────────────────────────

/// Events emitted while the server streams a generation turn.
///
/// Text-bearing variants (`token`, `paragraph_end`, `content`) append to the
/// caller's accumulator; the rest update status, choices, or storyline state.
/// `complete` and `error` are terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamEvent {
    /// Server progress note ("consulting the story bible…").
    #[serde(rename = "status")]
    Status {
        /// Human-readable progress message.
        message: String,
    },

    /// Incremental text fragment.
    #[serde(rename = "token")]
    Token {
        /// Fragment to append to the accumulator.
        content: String,
    },

    /// Text fragment that closes a paragraph.
    #[serde(rename = "paragraph_end")]
    ParagraphEnd {
        /// Closing fragment; may or may not already carry the separator.
        content: String,
    },

    /// Whole text block (legacy non-incremental path).
    #[serde(rename = "content")]
    Content {
        /// Complete fragment.
        content: String,
    },

    /// Running storyline state. The server owns this shape, so it is kept
    /// as loose JSON rather than a typed struct.
    #[serde(rename = "storyline")]
    Storyline {
        /// Opaque structured running state.
        storyline: Value,
    },

    /// Next-action choices for the current turn.
    #[serde(rename = "choices")]
    Choices {
        /// Ordered choice set; replaces any previous set.
        choices: Vec<Choice>,
    },

    /// Terminal event carrying the final structured results of the turn.
    #[serde(rename = "complete")]
    Complete {
        /// Final paragraphs produced this turn.
        #[serde(skip_serializing_if = "Option::is_none")]
        paragraphs: Option<Vec<String>>,
        /// New or revised bible entries.
        #[serde(skip_serializing_if = "Option::is_none")]
        bible_updates: Option<Vec<BibleEntry>>,
        /// New story events.
        #[serde(skip_serializing_if = "Option::is_none")]
        event_updates: Option<Vec<StoryEvent>>,
        /// Replacement choice set.
        #[serde(skip_serializing_if = "Option::is_none")]
        choices: Option<Vec<Choice>>,
    },

    /// Application-level failure delivered in-band (the stream itself
    /// succeeded in carrying the message).
    #[serde(rename = "error")]
    Error {
        /// Error message.
        error: String,
    },
}

impl StreamEvent {
    /// Get the wire type string for this event.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Token { .. } => "token",
            Self::ParagraphEnd { .. } => "paragraph_end",
            Self::Content { .. } => "content",
            Self::Storyline { .. } => "storyline",
            Self::Choices { .. } => "choices",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// The text fragment this event contributes to the accumulator, if any.
    ///
    /// `token`, `paragraph_end`, and `content` are the only text-bearing
    /// variants.
    #[must_use]
    pub fn text_fragment(&self) -> Option<&str> {
        match self {
            Self::Token { content }
            | Self::ParagraphEnd { content }
            | Self::Content { content } => Some(content),
            _ => None,
        }
    }

    /// Whether this event ends the turn (`complete` or `error`).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Factory helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Create a token event.
#[must_use]
pub fn token_event(content: impl Into<String>) -> StreamEvent {
    StreamEvent::Token {
        content: content.into(),
    }
}

/// Create a status event.
#[must_use]
pub fn status_event(message: impl Into<String>) -> StreamEvent {
    StreamEvent::Status {
        message: message.into(),
    }
}

/// Create an error event.
#[must_use]
pub fn error_event(error: impl Into<String>) -> StreamEvent {
    StreamEvent::Error {
        error: error.into(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Type guards
// ─────────────────────────────────────────────────────────────────────────────

/// Stream event type strings, in the order the server introduces them.
const STREAM_EVENT_TYPES: &[&str] = &[
    "status",
    "token",
    "paragraph_end",
    "content",
    "storyline",
    "choices",
    "complete",
    "error",
];

/// Check if a type string names a known stream event.
#[must_use]
pub fn is_stream_event_type(type_str: &str) -> bool {
    STREAM_EVENT_TYPES.contains(&type_str)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
