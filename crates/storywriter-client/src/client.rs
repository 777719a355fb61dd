//! HTTP client for the StoryWriter generation service.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use storywriter_core::{GenerationOutcome, RequestId};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backend::{StoryBackend, StreamEventStream};
use crate::error::{ClientError, ClientResult};
use crate::request::{GenerationParams, TurnRequest};
use crate::stream::event_stream;

/// Streaming endpoint path.
const STREAM_PATH: &str = "/api/story/stream";
/// Blocking endpoint path.
const GENERATE_PATH: &str = "/api/story/generate";

/// Connection settings for [`GenerationClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Service base URL, e.g. `https://story.example.com`.
    pub base_url: String,
    /// Bearer token sent in the `Authorization` header.
    pub auth_token: String,
    /// Default generation parameters; per-request values win.
    pub params: GenerationParams,
}

/// Client for the story generation endpoints.
///
/// One instance serves many turns over a shared connection pool. Turns
/// never retry on their own, and no request timeout is applied: a hung
/// exchange ends when its cancellation token fires.
#[derive(Clone, Debug)]
pub struct GenerationClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl GenerationClient {
    /// Create a client from connection settings.
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn build_headers(&self, accept: &'static str) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", self.config.auth_token);
        let auth = HeaderValue::from_str(&bearer).map_err(|_| ClientError::Config {
            message: "auth token contains characters not valid in a header".to_owned(),
        })?;
        let _ = headers.insert(AUTHORIZATION, auth);
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let _ = headers.insert(ACCEPT, HeaderValue::from_static(accept));
        Ok(headers)
    }

    /// Clone the request with its params resolved against the config defaults.
    fn merged_body(&self, request: &TurnRequest) -> TurnRequest {
        let mut body = request.clone();
        body.params = request.params.with_defaults(&self.config.params);
        body
    }
}

#[async_trait]
impl StoryBackend for GenerationClient {
    async fn stream_turn(
        &self,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> ClientResult<StreamEventStream> {
        let request_id = RequestId::new();
        let body = self.merged_body(request);
        debug!(
            request_id = %request_id,
            model = body.params.model.as_deref().unwrap_or("server-default"),
            "starting streaming turn",
        );

        let headers = self.build_headers("text/event-stream")?;
        let send = self
            .client
            .post(self.url(STREAM_PATH))
            .headers(headers)
            .json(&body)
            .send();

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        Ok(Box::pin(event_stream(
            response.bytes_stream(),
            cancel,
            request_id,
        )))
    }

    async fn generate_turn(
        &self,
        request: &TurnRequest,
        cancel: CancellationToken,
    ) -> ClientResult<GenerationOutcome> {
        let request_id = RequestId::new();
        let body = self.merged_body(request);
        debug!(request_id = %request_id, "starting blocking turn");

        let headers = self.build_headers("application/json")?;
        let send = self
            .client
            .post(self.url(GENERATE_PATH))
            .headers(headers)
            .json(&body)
            .send();

        let response = tokio::select! {
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = send => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
            });
        }

        let text = tokio::select! {
            () = cancel.cancelled() => return Err(ClientError::Cancelled),
            text = response.text() => text?,
        };
        let outcome: GenerationOutcome = serde_json::from_str(&text)?;

        debug!(
            request_id = %request_id,
            paragraphs = outcome.paragraphs.len(),
            choices = outcome.choices.len(),
            "blocking turn complete",
        );
        Ok(outcome)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
