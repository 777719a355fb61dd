//! Story domain payloads.
//!
//! These are the structured objects carried inside stream events, turn
//! requests, and the blocking generation response. All of them are produced
//! or revised by the server; the client treats them as immutable values and
//! only appends them to its collections.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Choice
// ─────────────────────────────────────────────────────────────────────────────

/// A server-offered next action in the interactive story flow.
///
/// The label is a short phrase (two to five words); the description
/// elaborates what taking the action means.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Short action label.
    pub label: String,
    /// What the action entails.
    pub description: String,
}

impl Choice {
    /// Create a choice.
    #[must_use]
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bible
// ─────────────────────────────────────────────────────────────────────────────

/// Kinds of fact the story bible tracks.
///
/// Unrecognized categories from newer servers deserialize as [`Other`]
/// rather than failing the whole record.
///
/// [`Other`]: BibleCategory::Other
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BibleCategory {
    /// A person or creature in the story.
    Character,
    /// A place.
    Setting,
    /// A significant item.
    Object,
    /// Anything else.
    #[default]
    #[serde(other)]
    Other,
}

/// A structured fact the server tracks across a multi-turn story.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BibleEntry {
    /// Name of the character, setting, or object.
    pub name: String,
    /// What kind of fact this is.
    #[serde(default)]
    pub category: BibleCategory,
    /// The fact itself.
    pub description: String,
}

impl BibleEntry {
    /// Create a bible entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        category: BibleCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            description: description.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Story events
// ─────────────────────────────────────────────────────────────────────────────

/// A narrative event in the running story.
///
/// Sent to the server as prior context and received back in
/// `event_updates` as the turn adds new ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    /// What happened.
    pub summary: String,
    /// Lasting effect on the story, when the server records one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequence: Option<String>,
}

impl StoryEvent {
    /// Create a story event with no recorded consequence.
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            consequence: None,
        }
    }

    /// Attach the lasting consequence of this event.
    #[must_use]
    pub fn with_consequence(mut self, consequence: impl Into<String>) -> Self {
        self.consequence = Some(consequence.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Structured results of one generation turn.
///
/// The blocking endpoint returns this object directly; the streaming
/// `complete` event carries the same fields individually (each optional).
/// All collections default to empty so a sparse server response still
/// deserializes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    /// Paragraphs produced this turn.
    #[serde(default)]
    pub paragraphs: Vec<String>,
    /// New or revised bible entries.
    #[serde(default)]
    pub bible_updates: Vec<BibleEntry>,
    /// New story events.
    #[serde(default)]
    pub event_updates: Vec<StoryEvent>,
    /// Choices for the next turn.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn choice_serde() {
        let c = Choice::new("Follow the river", "Track the current downstream.");
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["label"], "Follow the river");
        assert_eq!(json["description"], "Track the current downstream.");
        let back: Choice = serde_json::from_value(json).unwrap();
        assert_eq!(c, back);
    }

    #[test]
    fn bible_entry_serde() {
        let e = BibleEntry::new(
            "The Lighthouse",
            BibleCategory::Setting,
            "Abandoned since the storm.",
        );
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["category"], "setting");
        let back: BibleEntry = serde_json::from_value(json).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn bible_entry_missing_category_defaults_to_other() {
        let e: BibleEntry = serde_json::from_value(json!({
            "name": "Driftwood key",
            "description": "Opens nothing anyone remembers."
        }))
        .unwrap();
        assert_eq!(e.category, BibleCategory::Other);
    }

    #[test]
    fn bible_category_unknown_maps_to_other() {
        let e: BibleEntry = serde_json::from_value(json!({
            "name": "The Tide",
            "category": "phenomenon",
            "description": "Comes in wrong."
        }))
        .unwrap();
        assert_eq!(e.category, BibleCategory::Other);
    }

    #[test]
    fn story_event_serde() {
        let e = StoryEvent {
            summary: "The bridge collapsed".into(),
            consequence: Some("The village is cut off".into()),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["summary"], "The bridge collapsed");
        assert_eq!(json["consequence"], "The village is cut off");
    }

    #[test]
    fn story_event_omits_absent_consequence() {
        let e = StoryEvent::new("A knock at midnight");
        let json = serde_json::to_value(&e).unwrap();
        assert!(json.get("consequence").is_none());
        let back: StoryEvent = serde_json::from_value(json).unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn outcome_defaults_to_empty_collections() {
        let o: GenerationOutcome = serde_json::from_value(json!({})).unwrap();
        assert!(o.paragraphs.is_empty());
        assert!(o.bible_updates.is_empty());
        assert!(o.event_updates.is_empty());
        assert!(o.choices.is_empty());
    }

    #[test]
    fn outcome_full_roundtrip() {
        let o = GenerationOutcome {
            paragraphs: vec!["One.".into(), "Two.".into()],
            bible_updates: vec![BibleEntry::new(
                "Sel",
                BibleCategory::Character,
                "Keeps the light burning.",
            )],
            event_updates: vec![StoryEvent::new("Sel lit the lamp")],
            choices: vec![Choice::new("Climb the stairs", "Up to the lamp room.")],
        };
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["paragraphs"][1], "Two.");
        let back: GenerationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(o, back);
    }
}
