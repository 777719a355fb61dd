//! # storywriter-client
//!
//! Wire client for the StoryWriter generation service:
//!
//! - **Streaming turns**: POST to the stream endpoint, decode the chunked
//!   `data:`-line body into [`StreamEvent`]s in strict arrival order.
//! - **Blocking turns**: POST to the generate endpoint and decode one
//!   [`GenerationOutcome`](storywriter_core::GenerationOutcome) body.
//! - **Cancellation**: every turn takes a [`CancellationToken`]; an
//!   aborted turn ends silently rather than erroring.
//!
//! [`StreamEvent`]: storywriter_core::StreamEvent
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

#![deny(unsafe_code)]

pub mod backend;
pub mod client;
pub mod error;
pub mod request;
pub mod sse;
pub mod stream;

pub use backend::{StoryBackend, StreamEventStream};
pub use client::{ClientConfig, GenerationClient};
pub use error::{ClientError, ClientResult};
pub use request::{GenerationParams, TurnRequest};
pub use stream::event_stream;
