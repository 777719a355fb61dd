//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` to match the JSON
//! wire format of the service. Each type implements [`Default`] with
//! production default values, and `#[serde(default)]` allows partial JSON:
//! missing fields get their default during deserialization.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the StoryWriter client.
///
/// Loaded from `~/.storywriter/settings.json` with defaults applied for
/// missing fields. `STORYWRITER_*` environment variables override
/// specific values.
///
/// # JSON Format
///
/// All field names are camelCase. Example:
///
/// ```json
/// {
///   "version": "0.1.0",
///   "server": { "baseUrl": "https://story.example.com" },
///   "generation": { "model": "gpt-4o-mini", "maxTokens": 2048 }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorywriterSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Service connection settings.
    pub server: ServerSettings,
    /// Generation parameter defaults sent with every turn.
    pub generation: GenerationSettings,
    /// Story shape settings (paragraphs, choices, streaming).
    pub story: StorySettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for StorywriterSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "storywriter".to_string(),
            server: ServerSettings::default(),
            generation: GenerationSettings::default(),
            story: StorySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl StorywriterSettings {
    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidValue`] when a value is out of its
    /// valid range (choice count outside 2..=5, zero paragraphs, or a
    /// temperature outside 0.0..=2.0).
    pub fn validate(&self) -> Result<()> {
        if !(2..=5).contains(&self.story.choice_count) {
            return Err(SettingsError::InvalidValue(format!(
                "choiceCount must be between 2 and 5, got {}",
                self.story.choice_count
            )));
        }
        if self.story.paragraph_count == 0 {
            return Err(SettingsError::InvalidValue(
                "paragraphCount must be at least 1".to_string(),
            ));
        }
        if let Some(temperature) = self.generation.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(SettingsError::InvalidValue(format!(
                    "temperature must be between 0.0 and 2.0, got {temperature}"
                )));
            }
        }
        Ok(())
    }
}

/// Service connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Bearer token for the `Authorization` header. Usually supplied via
    /// the `STORYWRITER_AUTH_TOKEN` environment variable instead of the
    /// settings file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            auth_token: None,
        }
    }
}

/// Generation parameter defaults.
///
/// Every field is optional: an unset field is omitted from request bodies
/// so the server applies its own default.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    /// Model identifier.
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

/// Story shape settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorySettings {
    /// Paragraphs requested per turn.
    pub paragraph_count: u8,
    /// Choices requested per turn (valid range 2..=5).
    pub choice_count: u8,
    /// Whether to use the streaming endpoint; when false, turns fall back
    /// to the blocking endpoint.
    pub streaming: bool,
}

impl Default for StorySettings {
    fn default() -> Self {
        Self {
            paragraph_count: 3,
            choice_count: 3,
            streaming: true,
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default log filter when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_values() {
        let s = StorywriterSettings::default();
        assert_eq!(s.version, "0.1.0");
        assert_eq!(s.name, "storywriter");
        assert_eq!(s.server.base_url, "http://localhost:3000");
        assert_eq!(s.story.paragraph_count, 3);
        assert_eq!(s.story.choice_count, 3);
        assert!(s.story.streaming);
        assert_eq!(s.logging.level, "info");
        assert!(s.generation.model.is_none());
    }

    #[test]
    fn default_settings_serde_roundtrip() {
        let defaults = StorywriterSettings::default();
        let json = serde_json::to_string(&defaults).unwrap();
        let back: StorywriterSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, defaults.version);
        assert_eq!(back.server.base_url, defaults.server.base_url);
        assert_eq!(back.story.choice_count, defaults.story.choice_count);
    }

    #[test]
    fn settings_json_field_names_are_camel_case() {
        let json = serde_json::to_value(StorywriterSettings::default()).unwrap();

        assert!(json.get("version").is_some());
        let server = json.get("server").unwrap();
        assert!(server.get("baseUrl").is_some());
        // Unset token is omitted entirely.
        assert!(server.get("authToken").is_none());
        let story = json.get("story").unwrap();
        assert!(story.get("paragraphCount").is_some());
        assert!(story.get("choiceCount").is_some());
    }

    #[test]
    fn empty_json_produces_defaults() {
        let settings: StorywriterSettings = serde_json::from_str("{}").unwrap();
        let defaults = StorywriterSettings::default();
        assert_eq!(settings.version, defaults.version);
        assert_eq!(settings.server.base_url, defaults.server.base_url);
        assert_eq!(settings.story.paragraph_count, defaults.story.paragraph_count);
    }

    #[test]
    fn partial_json_overrides() {
        let json = serde_json::json!({
            "server": {"baseUrl": "https://story.example.com"},
            "generation": {"model": "gpt-4o", "maxTokens": 4096}
        });
        let settings: StorywriterSettings = serde_json::from_value(json).unwrap();
        assert_eq!(settings.server.base_url, "https://story.example.com");
        assert_eq!(settings.generation.model.as_deref(), Some("gpt-4o"));
        assert_eq!(settings.generation.max_tokens, Some(4096));
        // Unset fields keep their defaults.
        assert_eq!(settings.story.choice_count, 3);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(StorywriterSettings::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_choice_count_out_of_range() {
        let mut settings = StorywriterSettings::default();
        settings.story.choice_count = 7;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
        assert!(err.to_string().contains("choiceCount"));

        settings.story.choice_count = 1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_paragraphs() {
        let mut settings = StorywriterSettings::default();
        settings.story.paragraph_count = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn validate_rejects_temperature_out_of_range() {
        let mut settings = StorywriterSettings::default();
        settings.generation.temperature = Some(3.0);
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));

        settings.generation.temperature = Some(2.0);
        assert!(settings.validate().is_ok());
    }
}
