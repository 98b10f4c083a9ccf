//! Configuration management for the companion
//!
//! Settings are loaded from environment variables with sensible defaults and
//! can be overridden by command-line flags.
//!
//! # Environment Variables
//!
//! - `COMPANION_PROVIDER`: genai provider (openai|anthropic|gemini|ollama|groq|xai|...) - default: "openai"
//! - `COMPANION_MODEL`: Chat model name - default: "gpt-3.5-turbo"
//! - `COMPANION_PREFERENCES_FILE`: Preference file - default: "data/preferences.json"
//! - `COMPANION_REQUEST_TIMEOUT`: Timeout in seconds - default: "60"
//! - `COMPANION_TEMPERATURE`: Sampling temperature - default: "0.7"
//! - `COMPANION_MAX_TOKENS`: Reply token limit - default: "500"
//! - `COMPANION_HISTORY_WINDOW`: Messages of history sent per turn - default: "10"
//! - `COMPANION_VOICE`: Voice for spoken replies - default: "nova"
//! - `COMPANION_LOG_LEVEL`: Logging level - default: "info"
//!
//! Provider credentials are read by genai itself (`OPENAI_API_KEY`,
//! `ANTHROPIC_API_KEY`, `OLLAMA_HOST`, ...). Voice features use
//! `OPENAI_API_KEY` and, optionally, `OPENAI_API_BASE`.

use crate::companion::GenerationOptions;
use crate::llm::{GenAIClient, LLMClient};
use crate::preferences::DEFAULT_PREFERENCES_FILE;
use crate::speech::{self, SpeechClient, DEFAULT_API_BASE, DEFAULT_VOICE};
use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_HISTORY_WINDOW: usize = 10;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid provider name
    #[error("Invalid provider: {0}. Valid options: openai, anthropic, gemini, ollama, groq, xai")]
    InvalidProvider(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Parses a provider name as accepted on the command line and in the environment
pub fn parse_provider(s: &str) -> Result<AdapterKind, ConfigError> {
    AdapterKind::from_lower_str(&s.trim().to_lowercase())
        .ok_or_else(|| ConfigError::InvalidProvider(s.to_string()))
}

#[derive(Debug, Clone)]
pub struct CompanionConfig {
    /// LLM provider (from genai)
    pub provider: AdapterKind,

    /// Model name to use for chat and extraction (provider-specific)
    pub model: String,

    /// JSON file holding the preference list
    pub preferences_file: PathBuf,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Elicitation messages sent along with each turn
    pub history_window: usize,

    /// Voice used for spoken replies
    pub voice: String,

    /// Base URL for the audio endpoints
    pub speech_api_base: String,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for CompanionConfig {
    /// Loads from `COMPANION_*` environment variables, falling back to defaults
    fn default() -> Self {
        let provider = env::var("COMPANION_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::OpenAI);

        let model = env::var("COMPANION_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let preferences_file = env::var("COMPANION_PREFERENCES_FILE")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_FILE));

        let request_timeout_secs = env::var("COMPANION_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        let temperature = env::var("COMPANION_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        let max_tokens = env::var("COMPANION_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let history_window = env::var("COMPANION_HISTORY_WINDOW")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_HISTORY_WINDOW);

        let voice = env::var("COMPANION_VOICE")
            .unwrap_or_else(|_| DEFAULT_VOICE.to_string())
            .to_lowercase();

        let speech_api_base =
            env::var("OPENAI_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let log_level = env::var("COMPANION_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            provider,
            model,
            preferences_file,
            request_timeout_secs,
            temperature,
            max_tokens,
            history_window,
            voice,
            speech_api_base,
            log_level,
        }
    }
}

impl CompanionConfig {
    /// Validates the configuration
    ///
    /// Provider credentials are not checked here; genai reports them on the
    /// first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max tokens must be greater than zero".to_string(),
            ));
        }

        if self.history_window == 0 {
            return Err(ConfigError::ValidationFailed(
                "History window must include at least one message".to_string(),
            ));
        }

        if self.preferences_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Preferences file path cannot be empty".to_string(),
            ));
        }

        speech::validate_voice(&self.voice)
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            history_window: self.history_window,
        }
    }

    /// Creates the chat client for the configured provider and model
    pub fn create_client(&self) -> Arc<dyn LLMClient> {
        Arc::new(GenAIClient::new(
            self.provider,
            self.model.clone(),
            self.request_timeout(),
        ))
    }

    pub fn create_speech_client(&self) -> SpeechClient {
        SpeechClient::new(
            self.speech_api_base.clone(),
            env::var("OPENAI_API_KEY").ok(),
            self.request_timeout(),
        )
    }
}

impl fmt::Display for CompanionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Companion Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Preferences File: {}", self.preferences_file.display())?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Temperature: {}", self.temperature)?;
        writeln!(f, "  Max Tokens: {}", self.max_tokens)?;
        writeln!(f, "  History Window: {}", self.history_window)?;
        writeln!(f, "  Voice: {}", self.voice)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
