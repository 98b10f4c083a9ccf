//! Output formatting for preference listings and store reports

use anyhow::{Context, Result};

use crate::config::CompanionConfig;
use crate::preferences::{Preference, StoreReport};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_preferences(&self, preferences: &[Preference]) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(preferences)
                .context("Failed to serialize preferences to JSON"),
            OutputFormat::Human => Ok(format_preferences_human(preferences)),
        }
    }

    pub fn format_report(&self, report: &StoreReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).context("Failed to serialize store report")
            }
            OutputFormat::Human => Ok(format_report_human(report)),
        }
    }

    pub fn format_config(&self, config: &CompanionConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "provider": config.provider.as_str(),
                    "model": config.model,
                    "preferences_file": config.preferences_file,
                    "request_timeout_secs": config.request_timeout_secs,
                    "temperature": config.temperature,
                    "max_tokens": config.max_tokens,
                    "history_window": config.history_window,
                    "voice": config.voice,
                    "log_level": config.log_level,
                });
                serde_json::to_string_pretty(&output).context("Failed to serialize configuration")
            }
            OutputFormat::Human => Ok(config.to_string()),
        }
    }
}

/// One line per preference: source icon, text, id
pub fn format_preference_line(preference: &Preference) -> String {
    format!(
        "{} {}  [{}]",
        preference.source.icon(),
        preference.text,
        preference.id
    )
}

fn format_preferences_human(preferences: &[Preference]) -> String {
    if preferences.is_empty() {
        return "I haven't learned any preferences yet. Let's chat more!".to_string();
    }

    let mut output = format!(
        "I've learned {} {} about your preferences:\n",
        preferences.len(),
        if preferences.len() == 1 { "thing" } else { "things" }
    );
    for preference in preferences {
        output.push_str("  ");
        output.push_str(&format_preference_line(preference));
        output.push('\n');
    }
    output
}

fn format_report_human(report: &StoreReport) -> String {
    let path = report.path.display();
    if !report.exists {
        return format!("Preferences file not found at {}", path);
    }

    match (&report.record_count, &report.parse_error) {
        (_, Some(error)) => format!(
            "Preferences file {} ({} bytes) is not valid JSON: {}",
            path, report.bytes, error
        ),
        (Some(count), None) if report.unrecognized_count > 0 => format!(
            "Preferences file {} is valid: {} preferences, {} unrecognized entries ({} bytes)",
            path, count, report.unrecognized_count, report.bytes
        ),
        (Some(0), None) => format!("Preferences file {} exists but holds no preferences", path),
        (Some(count), None) => format!(
            "Preferences file {} is valid: {} preferences ({} bytes)",
            path, count, report.bytes
        ),
        (None, None) => format!("Preferences file {} could not be read", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PreferenceSource;
    use std::path::PathBuf;

    fn pref(id: &str, text: &str, source: PreferenceSource) -> Preference {
        Preference {
            id: id.to_string(),
            text: text.to_string(),
            source,
            timestamp: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_human_listing() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter
            .format_preferences(&[
                pref("a1", "jazz records", PreferenceSource::PatternDetected),
                pref("b2", "quiet mornings", PreferenceSource::LlmDetected),
            ])
            .unwrap();

        assert!(output.starts_with("I've learned 2 things"));
        assert!(output.contains("📝 jazz records  [a1]"));
        assert!(output.contains("🧠 quiet mornings  [b2]"));
    }

    #[test]
    fn test_human_listing_empty() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let output = formatter.format_preferences(&[]).unwrap();
        assert!(output.contains("haven't learned any preferences"));
    }

    #[test]
    fn test_json_listing() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter
            .format_preferences(&[pref("a1", "jazz records", PreferenceSource::ManualInput)])
            .unwrap();

        let parsed: Vec<Preference> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0].source, PreferenceSource::ManualInput);
    }

    #[test]
    fn test_report_human() {
        let formatter = OutputFormatter::new(OutputFormat::Human);
        let report = StoreReport {
            path: PathBuf::from("data/preferences.json"),
            exists: true,
            bytes: 120,
            record_count: Some(3),
            unrecognized_count: 0,
            parse_error: None,
        };
        assert_eq!(
            formatter.format_report(&report).unwrap(),
            "Preferences file data/preferences.json is valid: 3 preferences (120 bytes)"
        );

        let missing = StoreReport {
            exists: false,
            record_count: None,
            bytes: 0,
            ..report.clone()
        };
        assert!(formatter.format_report(&missing).unwrap().contains("not found"));

        let mixed = StoreReport {
            unrecognized_count: 2,
            ..report
        };
        assert!(formatter
            .format_report(&mixed)
            .unwrap()
            .contains("3 preferences, 2 unrecognized entries"));
    }
}
