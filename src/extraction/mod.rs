//! Preference extraction from free text
//!
//! Two best-effort heuristics run on every user utterance: a fixed set of
//! regex patterns, and a single LLM round-trip that answers in a
//! `PREFERENCE: ...` line format.

mod llm;
mod patterns;

pub use llm::{
    build_extraction_prompt, extract_with_llm, parse_extraction_response,
    EXTRACTOR_SYSTEM_PROMPT,
};
pub use patterns::PatternExtractor;
