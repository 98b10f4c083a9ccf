//! The preference companion
//!
//! Two chat modes share one preference store:
//!
//! - **Elicitation**: the user tells stories; the companion keeps the
//!   conversation going and quietly records preferences it hears.
//! - **Inference**: "ask me anything"; every known preference is folded into
//!   the system prompt so answers are personalized. New preferences heard
//!   here are recorded too.

mod prompts;
mod story;

pub use prompts::{inference_system_prompt, ELICITATION_SYSTEM_PROMPT};
pub use story::{StoryPrompter, STORY_PROMPTS};

use crate::extraction::{extract_with_llm, PatternExtractor};
use crate::llm::{BackendError, ChatMessage, LLMClient, LLMRequest};
use crate::preferences::{Preference, PreferenceSource, PreferenceStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CompanionError {
    #[error("LLM request failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Preference store error: {0}")]
    Store(#[from] StoreError),
}

/// Sampling and context settings for model calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    /// How many recent messages of an elicitation conversation are sent along
    pub history_window: usize,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            history_window: 10,
        }
    }
}

/// Result of one elicitation turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub reply: String,
    /// The preference this turn is best summarized by, if any was heard
    pub detected: Option<String>,
}

/// Which chat mode a preference was heard in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Elicitation,
    Inference,
}

impl Mode {
    fn pattern_source(self) -> PreferenceSource {
        match self {
            Mode::Elicitation => PreferenceSource::PatternDetected,
            Mode::Inference => PreferenceSource::InferencePattern,
        }
    }

    fn llm_source(self) -> PreferenceSource {
        match self {
            Mode::Elicitation => PreferenceSource::LlmDetected,
            Mode::Inference => PreferenceSource::InferenceLlm,
        }
    }
}

/// Preferences recorded while processing a single message
#[derive(Debug, Default)]
struct Harvest {
    pattern_hits: Vec<String>,
    llm_hit: Option<String>,
}

pub struct Companion {
    client: Arc<dyn LLMClient>,
    store: PreferenceStore,
    extractor: PatternExtractor,
    stories: StoryPrompter,
    conversations: HashMap<String, Vec<ChatMessage>>,
    options: GenerationOptions,
}

impl Companion {
    pub fn new(client: Arc<dyn LLMClient>, store: PreferenceStore) -> Self {
        Self::with_options(client, store, GenerationOptions::default())
    }

    pub fn with_options(
        client: Arc<dyn LLMClient>,
        store: PreferenceStore,
        options: GenerationOptions,
    ) -> Self {
        Self {
            client,
            store,
            extractor: PatternExtractor::new(),
            stories: StoryPrompter::new(),
            conversations: HashMap::new(),
            options,
        }
    }

    pub fn store(&self) -> &PreferenceStore {
        &self.store
    }

    pub fn preferences(&self) -> &[Preference] {
        self.store.list()
    }

    pub fn history(&self, user_id: &str) -> &[ChatMessage] {
        self.conversations
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn story_prompt(&mut self) -> &'static str {
        self.stories.next_prompt()
    }

    pub fn add_manual(&mut self, text: &str) -> Result<Option<Preference>, CompanionError> {
        Ok(self.store.add(text, PreferenceSource::ManualInput)?)
    }

    pub fn delete_preference(&mut self, id: &str) -> Result<bool, CompanionError> {
        Ok(self.store.delete(id)?)
    }

    pub fn clear_conversation(&mut self, user_id: &str) {
        if self.conversations.remove(user_id).is_some() {
            debug!("Cleared conversation for {}", user_id);
        }
    }

    /// Handles one message in elicitation mode.
    ///
    /// Extraction problems are logged and never fail the turn; a failed reply does.
    pub async fn process_message(
        &mut self,
        user_id: &str,
        message: &str,
    ) -> Result<Turn, CompanionError> {
        self.conversations
            .entry(user_id.to_string())
            .or_default()
            .push(ChatMessage::user(message));

        let harvest = self.harvest(message, Mode::Elicitation).await?;
        let detected = harvest
            .llm_hit
            .or_else(|| harvest.pattern_hits.into_iter().next());

        let history = self.history(user_id);
        let window_start = history.len().saturating_sub(self.options.history_window);
        let mut messages = Vec::with_capacity(history.len() - window_start + 1);
        messages.push(ChatMessage::system(ELICITATION_SYSTEM_PROMPT));
        messages.extend_from_slice(&history[window_start..]);

        let reply = self.complete(messages).await?;

        self.conversations
            .entry(user_id.to_string())
            .or_default()
            .push(ChatMessage::assistant(reply.clone()));

        Ok(Turn { reply, detected })
    }

    /// Handles one message in inference mode. Each question stands alone.
    pub async fn process_inference_message(
        &mut self,
        message: &str,
    ) -> Result<String, CompanionError> {
        self.harvest(message, Mode::Inference).await?;

        let system = inference_system_prompt(&self.store.format_for_prompt());
        self.complete(vec![ChatMessage::system(system), ChatMessage::user(message)])
            .await
    }

    async fn harvest(&mut self, message: &str, mode: Mode) -> Result<Harvest, CompanionError> {
        let mut harvest = Harvest {
            pattern_hits: self.extractor.extract(message),
            llm_hit: None,
        };

        for hit in &harvest.pattern_hits {
            self.store.add(hit, mode.pattern_source())?;
        }

        match extract_with_llm(
            self.client.as_ref(),
            message,
            self.options.temperature,
            self.options.max_tokens,
        )
        .await
        {
            Ok(Some(hit)) => {
                self.store.add(&hit, mode.llm_source())?;
                harvest.llm_hit = Some(hit);
            }
            Ok(None) => {}
            Err(e) => warn!("Preference extraction failed: {}", e),
        }

        if !harvest.pattern_hits.is_empty() || harvest.llm_hit.is_some() {
            info!(
                patterns = harvest.pattern_hits.len(),
                llm = harvest.llm_hit.is_some(),
                "Recorded preferences from {:?} message",
                mode
            );
        }
        Ok(harvest)
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompanionError> {
        let request = LLMRequest::new(messages)
            .with_temperature(self.options.temperature)
            .with_max_tokens(self.options.max_tokens);

        let response = self.client.chat(request).await?;
        debug!(
            "{} replied in {:?}",
            self.client.name(),
            response.response_time
        );
        Ok(response.content)
    }
}

impl std::fmt::Debug for Companion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Companion")
            .field("client", &self.client.name())
            .field("preferences", &self.store.len())
            .field("conversations", &self.conversations.len())
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MessageRole, MockLLMClient, MockResponse};
    use tempfile::TempDir;

    fn companion(dir: &TempDir, mock: Arc<MockLLMClient>) -> Companion {
        let store = PreferenceStore::open(dir.path().join("preferences.json")).unwrap();
        Companion::new(mock, store)
    }

    #[tokio::test]
    async fn test_elicitation_records_pattern_and_llm_hits() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: Loves hiking in the mountains"),
            MockResponse::text("That sounds wonderful! Where do you usually go?"),
        ]);
        let mut companion = companion(&dir, mock.clone());

        let turn = companion
            .process_message("user1", "I really love hiking in the mountains.")
            .await
            .unwrap();

        assert_eq!(turn.reply, "That sounds wonderful! Where do you usually go?");
        assert_eq!(turn.detected.as_deref(), Some("Loves hiking in the mountains"));

        let prefs = companion.preferences();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[0].text, "hiking in the mountains");
        assert_eq!(prefs[0].source, PreferenceSource::PatternDetected);
        assert_eq!(prefs[1].source, PreferenceSource::LlmDetected);

        let history = companion.history("user1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, MessageRole::Assistant);
    }

    #[tokio::test]
    async fn test_detected_falls_back_to_first_pattern_hit() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::error(BackendError::TimeoutError { seconds: 5 }),
            MockResponse::text("Mornings can be rough."),
        ]);
        let mut companion = companion(&dir, mock);

        let turn = companion
            .process_message("user1", "I hate getting up early")
            .await
            .unwrap();

        assert_eq!(turn.detected.as_deref(), Some("getting up early"));
        assert_eq!(companion.preferences().len(), 1);
    }

    #[tokio::test]
    async fn test_no_preference_heard() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("Tell me more!"),
        ]);
        let mut companion = companion(&dir, mock);

        let turn = companion
            .process_message("user1", "We drove to the coast yesterday")
            .await
            .unwrap();

        assert!(turn.detected.is_none());
        assert!(companion.preferences().is_empty());
    }

    #[tokio::test]
    async fn test_history_window_limits_context() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        let store = PreferenceStore::open(dir.path().join("preferences.json")).unwrap();
        let options = GenerationOptions {
            history_window: 3,
            ..GenerationOptions::default()
        };
        let mut companion = Companion::with_options(mock.clone(), store, options);

        for i in 0..3 {
            mock.add_responses(vec![
                MockResponse::text("PREFERENCE: NONE"),
                MockResponse::text(format!("reply {}", i)),
            ]);
            companion
                .process_message("user1", &format!("story {}", i))
                .await
                .unwrap();
        }

        let requests = mock.requests();
        let last_reply_request = requests.last().unwrap();
        assert_eq!(last_reply_request.messages.len(), 4);
        assert_eq!(last_reply_request.messages[0].role, MessageRole::System);
        assert_eq!(last_reply_request.messages[1].content, "story 1");
        assert_eq!(last_reply_request.messages[3].content, "story 2");
    }

    #[tokio::test]
    async fn test_conversations_are_per_user() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("hi alice"),
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("hi bob"),
        ]);
        let mut companion = companion(&dir, mock);

        companion.process_message("alice", "hello").await.unwrap();
        companion.process_message("bob", "hey").await.unwrap();

        assert_eq!(companion.history("alice").len(), 2);
        assert_eq!(companion.history("bob")[1].content, "hi bob");

        companion.clear_conversation("alice");
        assert!(companion.history("alice").is_empty());
        assert_eq!(companion.history("bob").len(), 2);
    }

    #[tokio::test]
    async fn test_reply_failure_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::error(BackendError::ApiError {
                message: "boom".to_string(),
                status_code: Some(500),
            }),
        ]);
        let mut companion = companion(&dir, mock);

        let result = companion.process_message("user1", "hello there").await;
        assert!(matches!(result, Err(CompanionError::Backend(_))));
    }

    #[tokio::test]
    async fn test_inference_uses_known_preferences() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: Wants a quiet getaway"),
            MockResponse::text("How about a cabin by a lake?"),
        ]);
        let mut companion = companion(&dir, mock.clone());
        companion.add_manual("prefers mountains over beaches").unwrap();

        let answer = companion
            .process_inference_message("Where should I go on vacation?")
            .await
            .unwrap();
        assert_eq!(answer, "How about a cabin by a lake?");

        let prefs = companion.preferences();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[1].source, PreferenceSource::InferenceLlm);

        let reply_request = mock.requests().pop().unwrap();
        assert_eq!(reply_request.messages.len(), 2);
        let system = &reply_request.messages[0].content;
        assert!(system.contains("- prefers mountains over beaches"));
        assert!(system.contains("- Wants a quiet getaway"));
        assert_eq!(reply_request.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_inference_pattern_source() {
        let dir = TempDir::new().unwrap();
        let mock = Arc::new(MockLLMClient::new());
        mock.add_responses(vec![
            MockResponse::text("PREFERENCE: NONE"),
            MockResponse::text("Try a slow-cooked stew."),
        ]);
        let mut companion = companion(&dir, mock);

        companion
            .process_inference_message("I never eat spicy food, what should I cook?")
            .await
            .unwrap();

        let prefs = companion.preferences();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].text, "eat spicy food, what should I cook?");
        assert_eq!(prefs[0].source, PreferenceSource::InferencePattern);
    }

    #[test]
    fn test_manual_and_delete() {
        let dir = TempDir::new().unwrap();
        let mut companion = companion(&dir, Arc::new(MockLLMClient::new()));

        let pref = companion.add_manual("board games on Fridays").unwrap().unwrap();
        assert_eq!(pref.source, PreferenceSource::ManualInput);
        assert!(companion.add_manual("no").unwrap().is_none());

        assert!(companion.delete_preference(&pref.id).unwrap());
        assert!(companion.preferences().is_empty());
    }
}
