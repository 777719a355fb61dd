//! Error taxonomy for turn generation requests.

/// Result alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced while requesting or consuming a generation turn.
///
/// Cancellation is a member of this taxonomy but is not a failure:
/// callers that abort a turn through its token receive [`ClientError::Cancelled`]
/// and are expected to discard it silently rather than report it.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network-level failure sending the request or reading the body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status. Fatal for the turn.
    #[error("HTTP error! status: {status}")]
    Status {
        /// HTTP status code from the response.
        status: u16,
    },

    /// A response body that must decode in full failed to decode.
    ///
    /// Only the blocking endpoint raises this; malformed records on the
    /// streaming endpoint are dropped without an error.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The client configuration cannot produce a valid request.
    #[error("config error: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },

    /// The turn was aborted through its cancellation token.
    #[error("turn cancelled")]
    Cancelled,
}

impl ClientError {
    /// Whether this error is the caller's own cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Stable category label for log fields.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Status { .. } => "status",
            Self::Json(_) => "decode",
            Self::Config { .. } => "config",
            Self::Cancelled => "cancelled",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
