//! # storywriter-session
//!
//! Owned state for a rolling interactive story. A [`StorySession`] holds
//! the text accumulator, persisted paragraphs, story bible, event log,
//! and current choices, and advances by consuming one streamed turn at a
//! time from a [`StoryBackend`](storywriter_client::StoryBackend).

#![deny(unsafe_code)]

pub mod session;

pub use session::{PARAGRAPH_SEPARATOR, StorySession, TurnPhase};
