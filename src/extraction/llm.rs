//! Single-round-trip LLM preference extraction

use crate::llm::{BackendError, ChatMessage, LLMClient, LLMRequest};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Marker the model answers with when the message holds no preference
const NO_PREFERENCE: &str = "NONE";

pub const EXTRACTOR_SYSTEM_PROMPT: &str =
    "You extract user preferences from messages. Output only the preference in the requested format.";

const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Based on the following message, extract any preference the user expresses. A preference can be anything the user likes, dislikes, values, believes in, wishes for, or prioritizes.
Capture preferences as stated, without judging them.

USER MESSAGE: {user_message}

If you detect a preference in the message, output it in this exact format:
PREFERENCE: [the preference statement]

If there is no clear preference, output:
PREFERENCE: NONE

Extract the full, detailed preference when possible, not just keywords."#;

/// Renders the extraction prompt around a user message
pub fn build_extraction_prompt(user_message: &str) -> String {
    EXTRACTION_PROMPT_TEMPLATE.replace("{user_message}", user_message)
}

fn preference_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"PREFERENCE:[ \t]*(.+)").expect("valid regex"))
}

/// Pulls the preference out of the model's answer.
///
/// Only the first `PREFERENCE:` line counts. `NONE` means nothing was found.
pub fn parse_extraction_response(response: &str) -> Option<String> {
    let caps = preference_line().captures(response)?;
    let value = caps[1]
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .trim_matches('"')
        .trim();

    let bare = value.trim_end_matches('.');
    if value.is_empty() || bare.eq_ignore_ascii_case(NO_PREFERENCE) {
        return None;
    }

    Some(value.to_string())
}

/// Asks the model for the preference in `user_message`, if any.
pub async fn extract_with_llm(
    client: &dyn LLMClient,
    user_message: &str,
    temperature: f32,
    max_tokens: u32,
) -> Result<Option<String>, BackendError> {
    let request = LLMRequest::new(vec![
        ChatMessage::system(EXTRACTOR_SYSTEM_PROMPT),
        ChatMessage::user(build_extraction_prompt(user_message)),
    ])
    .with_temperature(temperature)
    .with_max_tokens(max_tokens);

    let response = client.chat(request).await?;
    debug!(
        "Extraction answered in {:?}: {}",
        response.response_time, response.content
    );

    Ok(parse_extraction_response(&response.content))
}
