//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`StorywriterSettings::default()`]
//! 2. If `~/.storywriter/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `STORYWRITER_*` environment variable overrides (highest priority)
//! 4. Validate ranges; an out-of-range value fails the load
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::StorywriterSettings;

/// Resolve the path to the settings file (`~/.storywriter/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".storywriter").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<StorywriterSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or an out-of-range value, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<StorywriterSettings> {
    let defaults = serde_json::to_value(StorywriterSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: StorywriterSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Numbers must be valid and within the documented range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are ignored with a warning (fall back to file/default)
pub fn apply_env_overrides(settings: &mut StorywriterSettings) {
    // ── Server settings ─────────────────────────────────────────────
    if let Some(v) = read_env_string("STORYWRITER_BASE_URL") {
        settings.server.base_url = v;
    }
    if let Some(v) = read_env_string("STORYWRITER_AUTH_TOKEN") {
        settings.server.auth_token = Some(v);
    }

    // ── Generation settings ─────────────────────────────────────────
    if let Some(v) = read_env_string("STORYWRITER_MODEL") {
        settings.generation.model = Some(v);
    }
    if let Some(v) = read_env_f64("STORYWRITER_TEMPERATURE", 0.0, 2.0) {
        settings.generation.temperature = Some(v);
    }
    if let Some(v) = read_env_u32("STORYWRITER_MAX_TOKENS", 1, 128_000) {
        settings.generation.max_tokens = Some(v);
    }
    if let Some(v) = read_env_u64("STORYWRITER_SEED") {
        settings.generation.seed = Some(v);
    }

    // ── Story settings ──────────────────────────────────────────────
    if let Some(v) = read_env_u8("STORYWRITER_PARAGRAPH_COUNT", 1, 10) {
        settings.story.paragraph_count = v;
    }
    if let Some(v) = read_env_u8("STORYWRITER_CHOICE_COUNT", 2, 5) {
        settings.story.choice_count = v;
    }
    if let Some(v) = read_env_bool("STORYWRITER_STREAMING") {
        settings.story.streaming = v;
    }

    // ── Logging settings ────────────────────────────────────────────
    if let Some(v) = read_env_string("STORYWRITER_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u8` within a range.
pub fn parse_u8_range(val: &str, min: u8, max: u8) -> Option<u8> {
    let n: u8 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a finite `f64` within a range.
pub fn parse_f64_range(val: &str, min: f64, max: f64) -> Option<f64> {
    let n: f64 = val.parse().ok()?;
    (n.is_finite() && n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u8(name: &str, min: u8, max: u8) -> Option<u8> {
    let val = std::env::var(name).ok()?;
    let result = parse_u8_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u8 env var, ignoring");
    }
    result
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    let val = std::env::var(name).ok()?;
    let result = parse_u32_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u32 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = val.parse().ok();
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid integer env var, ignoring");
    }
    result
}

fn read_env_f64(name: &str, min: f64, max: f64) -> Option<f64> {
    let val = std::env::var(name).ok()?;
    let result = parse_f64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid f64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
