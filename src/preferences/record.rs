//! Preference record types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which heuristic (or person) produced a preference.
///
/// Tags that this build does not know about are kept as [`PreferenceSource::Other`]
/// so that rewriting the file never loses them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PreferenceSource {
    /// Typed in by the user through `prefs add` or `/add`
    ManualInput,
    /// Legacy tag for preferences added from a chat box
    ManualChat,
    /// Legacy tag for preferences picked up from a story
    StoryDetected,
    /// Regex hit in elicitation mode
    PatternDetected,
    /// LLM extraction hit in elicitation mode
    LlmDetected,
    /// Restated by the assistant in elicitation mode
    ResponseReflected,
    /// Regex hit in inference mode
    InferencePattern,
    /// LLM extraction hit in inference mode
    InferenceLlm,
    /// Restated by the assistant in inference mode
    InferenceReflected,
    /// Written by the store diagnostics
    TestScript,
    Other(String),
}

impl PreferenceSource {
    pub fn as_str(&self) -> &str {
        match self {
            PreferenceSource::ManualInput => "manual_input",
            PreferenceSource::ManualChat => "manual_chat",
            PreferenceSource::StoryDetected => "story_detected",
            PreferenceSource::PatternDetected => "pattern_detected",
            PreferenceSource::LlmDetected => "llm_detected",
            PreferenceSource::ResponseReflected => "response_reflected",
            PreferenceSource::InferencePattern => "inference_pattern",
            PreferenceSource::InferenceLlm => "inference_llm",
            PreferenceSource::InferenceReflected => "inference_reflected",
            PreferenceSource::TestScript => "test_script",
            PreferenceSource::Other(tag) => tag,
        }
    }

    /// Marker shown next to the preference when listing
    pub fn icon(&self) -> &'static str {
        match self {
            PreferenceSource::ManualInput => "✍️",
            PreferenceSource::PatternDetected => "📝",
            PreferenceSource::LlmDetected => "🧠",
            PreferenceSource::ResponseReflected => "🪞",
            PreferenceSource::InferencePattern => "🔍",
            PreferenceSource::InferenceLlm => "💡",
            PreferenceSource::InferenceReflected => "📊",
            _ => "💭",
        }
    }
}

impl From<String> for PreferenceSource {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "manual_input" => PreferenceSource::ManualInput,
            "manual_chat" => PreferenceSource::ManualChat,
            "story_detected" => PreferenceSource::StoryDetected,
            "pattern_detected" => PreferenceSource::PatternDetected,
            "llm_detected" => PreferenceSource::LlmDetected,
            "response_reflected" => PreferenceSource::ResponseReflected,
            "inference_pattern" => PreferenceSource::InferencePattern,
            "inference_llm" => PreferenceSource::InferenceLlm,
            "inference_reflected" => PreferenceSource::InferenceReflected,
            "test_script" => PreferenceSource::TestScript,
            _ => PreferenceSource::Other(tag),
        }
    }
}

impl From<PreferenceSource> for String {
    fn from(source: PreferenceSource) -> Self {
        match source {
            PreferenceSource::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PreferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single learned preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    /// Opaque unique token
    pub id: String,
    pub text: String,
    pub source: PreferenceSource,
    /// Local ISO-8601 creation time. Files written by older tools omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Fields this version does not know about, written back unchanged
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Preference {
    /// Creates a record with a fresh id and the current local time
    pub fn new(text: impl Into<String>, source: PreferenceSource) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            source,
            timestamp: Some(current_timestamp()),
            extra: serde_json::Map::new(),
        }
    }
}

/// Local time formatted without offset, e.g. `2024-05-01T09:30:12.123456`
pub fn current_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_tags_roundtrip_through_json() {
        let json = serde_json::to_string(&PreferenceSource::InferenceLlm).unwrap();
        assert_eq!(json, r#""inference_llm""#);

        let parsed: PreferenceSource = serde_json::from_str(r#""pattern_detected""#).unwrap();
        assert_eq!(parsed, PreferenceSource::PatternDetected);
    }

    #[test]
    fn test_unknown_source_is_preserved() {
        let parsed: PreferenceSource = serde_json::from_str(r#""imported_csv""#).unwrap();
        assert_eq!(parsed, PreferenceSource::Other("imported_csv".to_string()));
        assert_eq!(parsed.icon(), "💭");
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#""imported_csv""#);
    }

    #[test]
    fn test_new_preference_has_id_and_timestamp() {
        let a = Preference::new("long walks in the evening", PreferenceSource::ManualInput);
        let b = Preference::new("long walks in the evening", PreferenceSource::ManualInput);

        assert_ne!(a.id, b.id);
        assert!(uuid::Uuid::parse_str(&a.id).is_ok());
        let ts = a.timestamp.unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(&ts, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn test_record_without_timestamp_deserializes() {
        let json = r#"{"text": "Test preference 1", "source": "test_script", "id": "abc"}"#;
        let pref: Preference = serde_json::from_str(json).unwrap();

        assert_eq!(pref.id, "abc");
        assert_eq!(pref.source, PreferenceSource::TestScript);
        assert!(pref.timestamp.is_none());

        let out = serde_json::to_string(&pref).unwrap();
        assert!(!out.contains("timestamp"));
    }

    #[test]
    fn test_extra_fields_survive_roundtrip() {
        let json = r#"{"id": "abc", "text": "green tea", "source": "manual_input", "confidence": 0.9, "tags": ["drinks"]}"#;
        let pref: Preference = serde_json::from_str(json).unwrap();

        assert_eq!(pref.extra.len(), 2);
        assert_eq!(pref.extra["confidence"], serde_json::json!(0.9));

        let out: serde_json::Value = serde_json::to_value(&pref).unwrap();
        assert_eq!(out["confidence"], serde_json::json!(0.9));
        assert_eq!(out["tags"], serde_json::json!(["drinks"]));
        assert_eq!(out["source"], "manual_input");
    }
}
