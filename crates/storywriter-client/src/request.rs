//! Request body types for the generation endpoints.

use serde::{Deserialize, Serialize};
use storywriter_core::{BibleEntry, Choice, StoryEvent};

/// Generation parameters serialized into the request body.
///
/// Parameters are explicit per request rather than ambient server state.
/// Unset fields are omitted from the body and fall back to the server's
/// own defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    /// Model identifier, e.g. `gpt-4o-mini`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Upper bound on generated tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling seed for reproducible generations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GenerationParams {
    /// Fill unset fields from `defaults`; set fields win.
    #[must_use]
    pub fn with_defaults(&self, defaults: &Self) -> Self {
        Self {
            model: self.model.clone().or_else(|| defaults.model.clone()),
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
            seed: self.seed.or(defaults.seed),
        }
    }
}

/// One turn of story generation.
///
/// The caller sends full context every turn; the server holds no session
/// state between requests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    /// Story bible entries the generation must stay consistent with.
    #[serde(default)]
    pub bible: Vec<BibleEntry>,
    /// Prior story events, oldest first.
    #[serde(default)]
    pub events: Vec<StoryEvent>,
    /// The choice the reader took to get here, absent on the first turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_action: Option<Choice>,
    /// Free-text direction for where the story should head.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storyline_influence: Option<String>,
    /// Paragraphs to generate this turn; the server defaults to 3.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_count: Option<u8>,
    /// Choices to offer at the end of the turn; the server defaults to 3
    /// and accepts 2 through 5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice_count: Option<u8>,
    /// Generation parameters, flattened into the body.
    #[serde(flatten)]
    pub params: GenerationParams,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
