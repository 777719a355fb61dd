//! Rolling story session: applies streamed turn events to owned state.

use futures::StreamExt;
use storywriter_client::{ClientResult, StoryBackend, StreamEventStream, TurnRequest};
use storywriter_core::{BibleEntry, Choice, GenerationOutcome, SessionId, StoryEvent, StreamEvent};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Separator appended after a `paragraph_end` fragment that does not
/// already carry one.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Where a session currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TurnPhase {
    /// No turn running and nothing pending to show.
    #[default]
    Idle,
    /// A turn is streaming; the accumulator is live.
    Streaming,
    /// The last turn finished normally.
    Complete,
    /// The last turn failed; [`StorySession::last_error`] has the message.
    Failed,
}

/// Owned state for one interactive story, advanced one turn at a time.
///
/// The session owns everything the stream mutates: the append-only text
/// accumulator for the in-flight turn, the persisted paragraph/bible/event
/// collections, the current choice set, and the cancellation token of the
/// active turn. At most one turn is active at a time; starting a new one
/// first cancels its predecessor.
#[derive(Debug, Default)]
pub struct StorySession {
    session_id: SessionId,
    bible: Vec<BibleEntry>,
    events: Vec<StoryEvent>,
    paragraphs: Vec<String>,
    choices: Vec<Choice>,
    storyline: Option<serde_json::Value>,
    status: Option<String>,
    last_error: Option<String>,
    accumulator: String,
    phase: TurnPhase,
    active: Option<CancellationToken>,
}

impl StorySession {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with existing story context.
    #[must_use]
    pub fn with_context(bible: Vec<BibleEntry>, events: Vec<StoryEvent>) -> Self {
        Self {
            bible,
            events,
            ..Self::default()
        }
    }

    // ── turn lifecycle ──

    /// Start a turn: cancel any in-flight turn, reset per-turn state, and
    /// hand back a fresh cancellation token to thread into the request.
    ///
    /// The token is never reused; each turn gets its own.
    pub fn begin_turn(&mut self) -> CancellationToken {
        if let Some(previous) = self.active.take() {
            debug!(session_id = %self.session_id, "superseding in-flight turn");
            previous.cancel();
        }
        self.accumulator.clear();
        self.status = None;
        self.last_error = None;
        self.phase = TurnPhase::Streaming;

        let token = CancellationToken::new();
        self.active = Some(token.clone());
        debug!(session_id = %self.session_id, "turn started");
        token
    }

    /// Cancel the active turn, if any. Silent: the stream just ends and
    /// the session returns to [`TurnPhase::Idle`] without an error.
    pub fn cancel_turn(&mut self) {
        if let Some(token) = &self.active {
            debug!(session_id = %self.session_id, "cancelling turn");
            token.cancel();
        }
    }

    /// Whether a turn is currently streaming.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.phase == TurnPhase::Streaming
    }

    /// Build the request for the next turn from the session's context.
    #[must_use]
    pub fn next_request(&self, chosen_action: Option<Choice>) -> TurnRequest {
        TurnRequest {
            bible: self.bible.clone(),
            events: self.events.clone(),
            chosen_action,
            ..TurnRequest::default()
        }
    }

    /// Run one full turn against `backend`: begin, stream, apply, settle.
    ///
    /// Transport failures settle the session in [`TurnPhase::Failed`] and
    /// propagate; a cancelled turn settles in [`TurnPhase::Idle`] and
    /// returns `Ok`.
    pub async fn run_turn(
        &mut self,
        backend: &dyn StoryBackend,
        request: &TurnRequest,
    ) -> ClientResult<()> {
        let cancel = self.begin_turn();
        self.drive_turn(backend, request, cancel, |_| {}).await
    }

    /// Drive an already-started turn, invoking `on_event` for each decoded
    /// event before it is applied.
    ///
    /// `cancel` must be the token handed out by [`Self::begin_turn`] for this
    /// turn; threading it explicitly lets the caller keep a clone to cancel
    /// from a signal handler while the turn is in flight.
    pub async fn drive_turn<F>(
        &mut self,
        backend: &dyn StoryBackend,
        request: &TurnRequest,
        cancel: CancellationToken,
        on_event: F,
    ) -> ClientResult<()>
    where
        F: FnMut(&StreamEvent),
    {
        match backend.stream_turn(request, cancel).await {
            Ok(stream) => self.consume_with(stream, on_event).await,
            Err(err) if err.is_cancelled() => {
                self.settle_turn();
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Drive an already-started turn against the blocking endpoint and
    /// commit its outcome.
    ///
    /// Same token contract as [`Self::drive_turn`].
    pub async fn drive_blocking_turn(
        &mut self,
        backend: &dyn StoryBackend,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> ClientResult<()> {
        match backend.generate_turn(request, cancel).await {
            Ok(outcome) => {
                self.commit_outcome(outcome);
                Ok(())
            }
            Err(err) if err.is_cancelled() => {
                self.settle_turn();
                Ok(())
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err)
            }
        }
    }

    /// Drive a turn's event stream to completion, applying each event.
    ///
    /// Stops at the first terminal event (`complete` or `error`); anything
    /// the server sends after one is not applied.
    pub async fn consume(&mut self, stream: StreamEventStream) -> ClientResult<()> {
        self.consume_with(stream, |_| {}).await
    }

    /// [`Self::consume`] with an observer called for each event before it
    /// is applied, so a frontend can render fragments as they arrive.
    pub async fn consume_with<F>(
        &mut self,
        mut stream: StreamEventStream,
        mut on_event: F,
    ) -> ClientResult<()>
    where
        F: FnMut(&StreamEvent),
    {
        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    on_event(&event);
                    let terminal = event.is_terminal();
                    self.apply(event);
                    if terminal {
                        break;
                    }
                }
                Err(err) if err.is_cancelled() => break,
                Err(err) => {
                    self.fail(err.to_string());
                    return Err(err);
                }
            }
        }
        self.settle_turn();
        Ok(())
    }

    /// Apply one stream event to session state.
    ///
    /// This is the whole caller contract of the wire protocol: text events
    /// grow the accumulator, `choices` replaces the choice set, `complete`
    /// commits final results into the persisted collections and clears the
    /// accumulator, `error` records the failure message.
    pub fn apply(&mut self, event: StreamEvent) {
        trace!(session_id = %self.session_id, event_type = event.event_type(), "applying event");
        match event {
            StreamEvent::Status { message } => {
                self.status = Some(message);
            }
            StreamEvent::Token { content } | StreamEvent::Content { content } => {
                self.accumulator.push_str(&content);
            }
            StreamEvent::ParagraphEnd { content } => {
                self.accumulator.push_str(&content);
                if !content.ends_with(PARAGRAPH_SEPARATOR) {
                    self.accumulator.push_str(PARAGRAPH_SEPARATOR);
                }
            }
            StreamEvent::Storyline { storyline } => {
                self.storyline = Some(storyline);
            }
            StreamEvent::Choices { choices } => {
                self.choices = choices;
            }
            StreamEvent::Complete {
                paragraphs,
                bible_updates,
                event_updates,
                choices,
            } => {
                if let Some(paragraphs) = paragraphs {
                    self.paragraphs.extend(paragraphs);
                }
                if let Some(updates) = bible_updates {
                    self.bible.extend(updates);
                }
                if let Some(updates) = event_updates {
                    self.events.extend(updates);
                }
                if let Some(choices) = choices {
                    self.choices = choices;
                }
                self.accumulator.clear();
            }
            StreamEvent::Error { error } => {
                warn!(session_id = %self.session_id, %error, "turn reported an error");
                self.last_error = Some(error);
            }
        }
    }

    /// Fold a blocking-endpoint outcome into the persisted collections.
    ///
    /// An empty choice set means the server sent none; the previous set
    /// stays in place, matching how an absent `choices` field on a
    /// `complete` event behaves.
    fn commit_outcome(&mut self, outcome: GenerationOutcome) {
        self.paragraphs.extend(outcome.paragraphs);
        self.bible.extend(outcome.bible_updates);
        self.events.extend(outcome.event_updates);
        if !outcome.choices.is_empty() {
            self.choices = outcome.choices;
        }
        self.accumulator.clear();
        self.settle_turn();
    }

    /// Settle the finished turn into its terminal phase.
    ///
    /// Cancellation wins over everything and is silent; otherwise an
    /// applied `error` event or recorded failure means [`TurnPhase::Failed`].
    fn settle_turn(&mut self) {
        let cancelled = self
            .active
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled);
        self.active = None;
        self.status = None;

        self.phase = if cancelled {
            TurnPhase::Idle
        } else if self.last_error.is_some() {
            TurnPhase::Failed
        } else {
            TurnPhase::Complete
        };
        debug!(
            session_id = %self.session_id,
            phase = ?self.phase,
            accumulated = self.accumulator.len(),
            paragraphs = self.paragraphs.len(),
            "turn settled",
        );
    }

    fn fail(&mut self, message: String) {
        warn!(session_id = %self.session_id, error = %message, "turn failed");
        self.last_error = Some(message);
        self.active = None;
        self.status = None;
        self.phase = TurnPhase::Failed;
    }

    // ── accessors ──

    /// Stable identifier for this session, used in log correlation.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Text streamed so far in the current turn.
    #[must_use]
    pub fn accumulator(&self) -> &str {
        &self.accumulator
    }

    /// Paragraphs committed by completed turns.
    #[must_use]
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Current choice set, replaced wholesale by the server.
    #[must_use]
    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    /// Story bible accumulated so far.
    #[must_use]
    pub fn bible(&self) -> &[BibleEntry] {
        &self.bible
    }

    /// Story events accumulated so far, oldest first.
    #[must_use]
    pub fn events(&self) -> &[StoryEvent] {
        &self.events
    }

    /// Latest transient status message, if a turn is streaming.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Latest structured storyline state sent by the server.
    #[must_use]
    pub fn storyline(&self) -> Option<&serde_json::Value> {
        self.storyline.as_ref()
    }

    /// Failure message of the last turn, if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream as futstream;
    use storywriter_client::{ClientError, event_stream};
    use storywriter_core::events::{error_event, status_event, token_event};
    use storywriter_core::{BibleCategory, GenerationOutcome, RequestId};

    fn token_chunks() -> Vec<Result<Bytes, reqwest::Error>> {
        vec![
            Ok(Bytes::from("data: {\"type\":\"token\",\"content\":\"Hel")),
            Ok(Bytes::from("lo\"}\n")),
            Ok(Bytes::from(
                "data: {\"type\":\"token\",\"content\":\" world\"}\ndata: [DONE]\n",
            )),
        ]
    }

    // ── apply ──

    #[test]
    fn token_events_grow_the_accumulator() {
        let mut session = StorySession::new();
        session.apply(token_event("Hello"));
        session.apply(token_event(" world"));
        assert_eq!(session.accumulator(), "Hello world");
    }

    #[test]
    fn content_event_appends_verbatim() {
        let mut session = StorySession::new();
        session.apply(StreamEvent::Content {
            content: "full fragment".to_owned(),
        });
        assert_eq!(session.accumulator(), "full fragment");
    }

    #[test]
    fn paragraph_end_appends_separator_when_absent() {
        let mut session = StorySession::new();
        session.apply(StreamEvent::ParagraphEnd {
            content: "The door closed.".to_owned(),
        });
        session.apply(token_event("Night fell."));
        assert_eq!(session.accumulator(), "The door closed.\n\nNight fell.");
    }

    #[test]
    fn paragraph_end_keeps_existing_separator() {
        let mut session = StorySession::new();
        session.apply(StreamEvent::ParagraphEnd {
            content: "The door closed.\n\n".to_owned(),
        });
        assert_eq!(session.accumulator(), "The door closed.\n\n");
    }

    #[test]
    fn status_is_transient_informational_state() {
        let mut session = StorySession::new();
        session.apply(status_event("Writing your story..."));
        assert_eq!(session.status(), Some("Writing your story..."));
        assert_eq!(session.accumulator(), "");
    }

    #[test]
    fn storyline_is_stored_without_touching_accumulator() {
        let mut session = StorySession::new();
        session.apply(token_event("text"));
        session.apply(StreamEvent::Storyline {
            storyline: serde_json::json!({"act": 2, "tone": "ominous"}),
        });
        assert_eq!(session.accumulator(), "text");
        assert_eq!(session.storyline().unwrap()["act"], 2);
    }

    #[test]
    fn choices_replace_the_previous_set() {
        let mut session = StorySession::new();
        session.apply(StreamEvent::Choices {
            choices: vec![Choice::new("Go left", "Into the dark.")],
        });
        session.apply(StreamEvent::Choices {
            choices: vec![
                Choice::new("Go right", "Toward the light."),
                Choice::new("Stay put", "Wait it out."),
            ],
        });
        assert_eq!(session.choices().len(), 2);
        assert_eq!(session.choices()[0].label, "Go right");
    }

    #[test]
    fn complete_commits_results_and_clears_accumulator() {
        let mut session = StorySession::with_context(
            vec![BibleEntry::new(
                "Mara",
                BibleCategory::Character,
                "Keeper.",
            )],
            vec![StoryEvent::new("The lamp went dark.")],
        );
        session.apply(token_event("streamed text"));
        session.apply(StreamEvent::Complete {
            paragraphs: Some(vec!["First paragraph.".to_owned()]),
            bible_updates: Some(vec![BibleEntry::new(
                "The tower",
                BibleCategory::Setting,
                "Cracked stone.",
            )]),
            event_updates: Some(vec![StoryEvent::new("A stranger arrived.")]),
            choices: Some(vec![Choice::new("Greet them", "Open the door.")]),
        });

        assert_eq!(session.accumulator(), "");
        assert_eq!(session.paragraphs(), ["First paragraph."]);
        assert_eq!(session.bible().len(), 2);
        assert_eq!(session.bible()[1].name, "The tower");
        assert_eq!(session.events().len(), 2);
        assert_eq!(session.choices().len(), 1);
    }

    #[test]
    fn complete_with_absent_fields_changes_nothing_but_accumulator() {
        let mut session = StorySession::new();
        session.apply(StreamEvent::Choices {
            choices: vec![Choice::new("Keep going", "Press on.")],
        });
        session.apply(token_event("partial"));
        session.apply(StreamEvent::Complete {
            paragraphs: None,
            bible_updates: None,
            event_updates: None,
            choices: None,
        });
        assert_eq!(session.accumulator(), "");
        assert!(session.paragraphs().is_empty());
        // Absent choices leave the previous set in place.
        assert_eq!(session.choices().len(), 1);
    }

    // ── turn lifecycle ──

    #[test]
    fn begin_turn_resets_turn_state_and_cancels_predecessor() {
        let mut session = StorySession::new();
        let first = session.begin_turn();
        session.apply(token_event("stale"));
        session.apply(status_event("Working..."));

        let second = session.begin_turn();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(session.accumulator(), "");
        assert_eq!(session.status(), None);
        assert!(session.is_streaming());
    }

    #[test]
    fn cancel_turn_fires_the_active_token() {
        let mut session = StorySession::new();
        let token = session.begin_turn();
        session.cancel_turn();
        assert!(token.is_cancelled());

        // Without an active turn it is a no-op.
        let mut idle = StorySession::new();
        idle.cancel_turn();
        assert_eq!(idle.phase(), TurnPhase::Idle);
    }

    #[tokio::test]
    async fn consume_applies_events_and_settles_complete() {
        let mut session = StorySession::new();
        let _token = session.begin_turn();

        let stream: StreamEventStream = Box::pin(futstream::iter(vec![
            Ok(status_event("Writing your story...")),
            Ok(token_event("Once")),
            Ok(token_event(" upon a time")),
        ]));
        session.consume(stream).await.unwrap();

        assert_eq!(session.accumulator(), "Once upon a time");
        assert_eq!(session.phase(), TurnPhase::Complete);
        // Transient status is dropped once the turn settles.
        assert_eq!(session.status(), None);
    }

    #[tokio::test]
    async fn error_event_settles_failed_and_stops_applying() {
        let mut session = StorySession::new();
        let _token = session.begin_turn();

        let stream: StreamEventStream = Box::pin(futstream::iter(vec![
            Ok(error_event("generation failed")),
            Ok(token_event("never applied")),
        ]));
        session.consume(stream).await.unwrap();

        assert_eq!(session.phase(), TurnPhase::Failed);
        assert_eq!(session.last_error(), Some("generation failed"));
        assert_eq!(session.accumulator(), "");
    }

    #[tokio::test]
    async fn transport_error_is_recorded_and_propagated() {
        let mut session = StorySession::new();
        let _token = session.begin_turn();

        let stream: StreamEventStream = Box::pin(futstream::iter(vec![
            Ok(token_event("partial")),
            Err(ClientError::Status { status: 502 }),
        ]));
        let err = session.consume(stream).await.unwrap_err();

        assert_eq!(err.to_string(), "HTTP error! status: 502");
        assert_eq!(session.phase(), TurnPhase::Failed);
        assert_eq!(session.last_error(), Some("HTTP error! status: 502"));
        assert_eq!(session.accumulator(), "partial");
    }

    #[tokio::test]
    async fn cancelled_turn_settles_idle_without_error() {
        let mut session = StorySession::new();
        let token = session.begin_turn();

        let cancel = token.clone();
        let stream: StreamEventStream = Box::pin(async_stream::stream! {
            yield Ok(token_event("partial"));
            cancel.cancel();
        });
        session.consume(stream).await.unwrap();

        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.last_error(), None);
        assert_eq!(session.accumulator(), "partial");
    }

    // ── full pipeline ──

    #[tokio::test]
    async fn pipeline_chunks_accumulate_into_hello_world() {
        let mut session = StorySession::new();
        let token = session.begin_turn();
        let stream = event_stream(
            futstream::iter(token_chunks()),
            token,
            RequestId::new(),
        );
        session.consume(Box::pin(stream)).await.unwrap();

        assert_eq!(session.accumulator(), "Hello world");
        assert_eq!(session.phase(), TurnPhase::Complete);
    }

    #[tokio::test]
    async fn replaying_identical_chunks_gives_identical_sessions() {
        let mut first = StorySession::new();
        let token = first.begin_turn();
        first
            .consume(Box::pin(event_stream(
                futstream::iter(token_chunks()),
                token,
                RequestId::new(),
            )))
            .await
            .unwrap();

        let mut second = StorySession::new();
        let token = second.begin_turn();
        second
            .consume(Box::pin(event_stream(
                futstream::iter(token_chunks()),
                token,
                RequestId::new(),
            )))
            .await
            .unwrap();

        assert_eq!(first.accumulator(), second.accumulator());
        assert_eq!(first.paragraphs(), second.paragraphs());
        assert_eq!(first.phase(), second.phase());
        // Session identity stays distinct even when content matches.
        assert_ne!(first.session_id(), second.session_id());
    }

    // ── scripted backend ──

    struct ScriptedBackend {
        events: Vec<StreamEvent>,
        outcome: GenerationOutcome,
    }

    #[async_trait]
    impl StoryBackend for ScriptedBackend {
        async fn stream_turn(
            &self,
            _request: &TurnRequest,
            _cancel: CancellationToken,
        ) -> ClientResult<StreamEventStream> {
            let events = self.events.clone();
            Ok(Box::pin(futstream::iter(events.into_iter().map(Ok))))
        }

        async fn generate_turn(
            &self,
            _request: &TurnRequest,
            _cancel: CancellationToken,
        ) -> ClientResult<GenerationOutcome> {
            Ok(self.outcome.clone())
        }
    }

    /// Backend whose connection attempt was already torn down.
    struct CancelledBackend;

    #[async_trait]
    impl StoryBackend for CancelledBackend {
        async fn stream_turn(
            &self,
            _request: &TurnRequest,
            _cancel: CancellationToken,
        ) -> ClientResult<StreamEventStream> {
            Err(ClientError::Cancelled)
        }

        async fn generate_turn(
            &self,
            _request: &TurnRequest,
            _cancel: CancellationToken,
        ) -> ClientResult<GenerationOutcome> {
            Err(ClientError::Cancelled)
        }
    }

    #[tokio::test]
    async fn run_turn_drives_a_scripted_backend_to_completion() {
        let backend = ScriptedBackend {
            events: vec![
                status_event("Writing your story..."),
                token_event("The bear woke."),
                StreamEvent::Complete {
                    paragraphs: Some(vec!["The bear woke.".to_owned()]),
                    bible_updates: None,
                    event_updates: None,
                    choices: Some(vec![
                        Choice::new("Feed it", "Offer the honey."),
                        Choice::new("Run", "Leave everything."),
                    ]),
                },
            ],
            outcome: GenerationOutcome::default(),
        };

        let mut session = StorySession::new();
        let request = session.next_request(None);
        session.run_turn(&backend, &request).await.unwrap();

        assert_eq!(session.phase(), TurnPhase::Complete);
        assert_eq!(session.paragraphs(), ["The bear woke."]);
        assert_eq!(session.choices().len(), 2);
        assert_eq!(session.accumulator(), "");
    }

    #[tokio::test]
    async fn drive_turn_reports_each_event_before_applying() {
        let backend = ScriptedBackend {
            events: vec![
                status_event("Writing your story..."),
                token_event("Hi"),
            ],
            outcome: GenerationOutcome::default(),
        };

        let mut session = StorySession::new();
        let request = session.next_request(None);
        let cancel = session.begin_turn();
        let mut seen = Vec::new();
        session
            .drive_turn(&backend, &request, cancel, |event| {
                seen.push(event.event_type());
            })
            .await
            .unwrap();

        assert_eq!(seen, ["status", "token"]);
        assert_eq!(session.accumulator(), "Hi");
        assert_eq!(session.phase(), TurnPhase::Complete);
    }

    #[tokio::test]
    async fn drive_blocking_turn_commits_the_outcome() {
        let backend = ScriptedBackend {
            events: Vec::new(),
            outcome: GenerationOutcome {
                paragraphs: vec!["It rained all night.".to_owned()],
                bible_updates: vec![BibleEntry::new(
                    "The inn",
                    BibleCategory::Setting,
                    "Leaky roof.",
                )],
                event_updates: Vec::new(),
                choices: vec![Choice::new("Wait", "Let the storm pass.")],
            },
        };

        let mut session = StorySession::new();
        let request = session.next_request(None);
        let cancel = session.begin_turn();
        session
            .drive_blocking_turn(&backend, &request, cancel)
            .await
            .unwrap();

        assert_eq!(session.phase(), TurnPhase::Complete);
        assert_eq!(session.paragraphs(), ["It rained all night."]);
        assert_eq!(session.bible().len(), 1);
        assert_eq!(session.choices().len(), 1);
    }

    #[tokio::test]
    async fn blocking_outcome_without_choices_keeps_previous_set() {
        let backend = ScriptedBackend {
            events: Vec::new(),
            outcome: GenerationOutcome {
                paragraphs: vec!["More rain.".to_owned()],
                ..GenerationOutcome::default()
            },
        };

        let mut session = StorySession::new();
        session.apply(StreamEvent::Choices {
            choices: vec![Choice::new("Stay", "Hold position.")],
        });
        let request = session.next_request(None);
        let cancel = session.begin_turn();
        session
            .drive_blocking_turn(&backend, &request, cancel)
            .await
            .unwrap();

        assert_eq!(session.choices().len(), 1);
        assert_eq!(session.paragraphs(), ["More rain."]);
    }

    #[tokio::test]
    async fn cancelled_before_connect_settles_idle() {
        let mut session = StorySession::new();
        let request = session.next_request(None);
        let cancel = session.begin_turn();
        cancel.cancel();
        session
            .drive_turn(&CancelledBackend, &request, cancel, |_| {})
            .await
            .unwrap();

        assert_eq!(session.phase(), TurnPhase::Idle);
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn next_request_carries_session_context() {
        let session = StorySession::with_context(
            vec![BibleEntry::new(
                "Mara",
                BibleCategory::Character,
                "Keeper.",
            )],
            vec![StoryEvent::new("The lamp went dark.")],
        );
        let request = session.next_request(Some(Choice::new("Climb", "Up the stairs.")));

        assert_eq!(request.bible.len(), 1);
        assert_eq!(request.events.len(), 1);
        assert_eq!(request.chosen_action.unwrap().label, "Climb");
    }
}
