//! Pipeline from a chunked response body to a stream of turn events.

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use storywriter_core::{RequestId, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::sse::{DONE_SENTINEL, LineFramer, data_payload, parse_event};

/// Decode a chunked response body into [`StreamEvent`]s.
///
/// Events are yielded strictly in wire order, one per `data:` record.
/// Three things end the stream early, all without an error item: the
/// `[DONE]` sentinel (remaining buffered bytes and chunks are left
/// unread), cancellation of `cancel` (checked before each chunk read,
/// even when data is already waiting), and end of body. A failed body
/// read yields one [`ClientError::Http`] item and then ends the stream.
pub fn event_stream<S>(
    body: S,
    cancel: CancellationToken,
    request_id: RequestId,
) -> impl Stream<Item = ClientResult<StreamEvent>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    stream! {
        let mut body = body;
        let mut framer = LineFramer::new();
        let mut yielded = 0_usize;

        'read: loop {
            // Cancellation outranks a chunk that is already waiting.
            let chunk = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(request_id = %request_id, events = yielded, "turn stream cancelled");
                    break 'read;
                }
                chunk = body.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => {
                    for line in framer.push(&bytes) {
                        let Some(payload) = data_payload(&line) else {
                            continue;
                        };
                        if payload == DONE_SENTINEL {
                            debug!(
                                request_id = %request_id,
                                events = yielded,
                                "turn stream completed",
                            );
                            break 'read;
                        }
                        if let Some(event) = parse_event(payload) {
                            yielded += 1;
                            yield Ok(event);
                        }
                    }
                }
                Some(Err(error)) => {
                    warn!(request_id = %request_id, %error, "turn stream read failed");
                    yield Err(ClientError::Http(error));
                    break 'read;
                }
                None => {
                    if framer.pending() > 0 {
                        debug!(
                            request_id = %request_id,
                            bytes = framer.pending(),
                            "discarding unterminated trailing fragment",
                        );
                    }
                    debug!(
                        request_id = %request_id,
                        events = yielded,
                        "turn stream ended without sentinel",
                    );
                    break 'read;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
