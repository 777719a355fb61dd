//! Backend seam for turn generation.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use storywriter_core::{GenerationOutcome, StreamEvent};
use tokio_util::sync::CancellationToken;

use crate::error::ClientResult;
use crate::request::TurnRequest;

/// Boxed stream of turn events, one per wire record, in arrival order.
pub type StreamEventStream = Pin<Box<dyn Stream<Item = ClientResult<StreamEvent>> + Send>>;

/// A producer of generation turns.
///
/// [`GenerationClient`](crate::GenerationClient) is the wire implementation;
/// session drivers depend on this trait so tests can substitute scripted
/// producers.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Start a streaming turn.
    ///
    /// Resolves once the response headers arrive; the returned stream then
    /// yields events as records decode. Cancelling `cancel` ends the stream
    /// at the next suspension point without an error item.
    async fn stream_turn(
        &self,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> ClientResult<StreamEventStream>;

    /// Generate a turn in one blocking exchange, no streaming.
    async fn generate_turn(
        &self,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> ClientResult<GenerationOutcome>;
}
