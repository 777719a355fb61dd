//! # storywriter-core
//!
//! Shared vocabulary for the StoryWriter generation client. Every other
//! crate in the workspace depends on these types:
//!
//! - **Stream events**: [`StreamEvent`], the tagged records carried as
//!   `data: <json>` lines on the generation stream
//! - **Story domain**: [`Choice`], [`BibleEntry`], [`StoryEvent`], and
//!   [`GenerationOutcome`], the structured payloads inside events,
//!   requests, and the blocking response
//! - **Branded IDs**: [`SessionId`], [`RequestId`] newtypes for log
//!   correlation

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod story;

pub use events::{StreamEvent, is_stream_event_type};
pub use ids::{RequestId, SessionId};
pub use story::{BibleCategory, BibleEntry, Choice, GenerationOutcome, StoryEvent};
