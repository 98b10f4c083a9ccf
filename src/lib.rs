//! companion - a conversational preference-elicitation companion
//!
//! The user tells stories; the companion keeps the conversation going and
//! picks preference statements out of what it hears, using regex patterns and
//! a single LLM round-trip per message. Preferences are kept in a flat JSON
//! file and later folded into an "ask me anything" mode so its answers are
//! personalized.
//!
//! # Project Structure
//!
//! - [`preferences`]: preference records and the JSON-file store
//! - [`extraction`]: regex and LLM preference extraction
//! - [`companion`]: the two chat modes built on top of both
//! - [`llm`]: provider-independent chat client abstraction (genai-backed)
//! - [`speech`]: speech synthesis and transcription over HTTP
//! - [`cli`]: command-line interface and interactive sessions
//!
//! # Example Usage
//!
//! ```no_run
//! use companion::{Companion, CompanionConfig, PreferenceStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CompanionConfig::default();
//! config.validate()?;
//!
//! let store = PreferenceStore::open(&config.preferences_file)?;
//! let mut companion = Companion::with_options(
//!     config.create_client(),
//!     store,
//!     config.generation_options(),
//! );
//!
//! let turn = companion
//!     .process_message("user1", "I love hiking in the mountains.")
//!     .await?;
//! println!("{}", turn.reply);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod companion;
pub mod config;
pub mod extraction;
pub mod llm;
pub mod preferences;
pub mod speech;
pub mod util;

pub use companion::{Companion, CompanionError, GenerationOptions, Turn};
pub use config::{CompanionConfig, ConfigError};
pub use extraction::PatternExtractor;
pub use llm::{BackendError, GenAIClient, LLMClient};
pub use preferences::{Preference, PreferenceSource, PreferenceStore, StoreError};
pub use speech::{SpeechClient, SpeechError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_package_name() {
        assert_eq!(NAME, "preference-companion");
    }
}
