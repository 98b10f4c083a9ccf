//! Regex-based preference detection
//!
//! Each pattern anchors on a first-person trigger phrase ("I love", "it annoys
//! me when", ...) and captures the rest of the clause up to the first `.`, `!`,
//! newline or end of input.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Captures this short or shorter are noise ("it", "that", "tea")
const MIN_CAPTURE_CHARS: usize = 5;

const CLAUSE_END: &str = r"(?:[.!\n]|$)";

/// Trigger phrases, each followed by the captured clause
const TRIGGERS: &[&str] = &[
    r"\bI (?:really )?(?:like|love|enjoy|prefer|adore|am fond of|favor) (.+?)",
    r"\bI['’]m (?:a big fan of|passionate about|interested in) (.+?)",
    // Whole clause, so the value survives along with the category
    r"\bMy (favorite .+? (?:is|are) .+?)",
    r"\bI (?:hate|dislike|can['’]t stand|despise) (.+?)",
    r"\bI (?:wish|want|would like|hope|desire) (.+?)",
    r"\bI (?:believe|think|feel|am convinced) (?:that )?(.+?)",
    r"\bI['’]m (?:attracted to|into|turned on by) (.+?)",
    r"\bI (?:always|usually|often|sometimes|rarely|never) (.+?)",
    r"\bI\s+prefer\s+(.*?)",
    r"\bI\s+need\s+(.*?)",
    r"\bI\s+would\s+prefer\s+(.*?)",
    r"\bI\s+don['’]t\s+like\s+(.*?)",
    r"\bI\s+appreciate\s+(.*?)",
    r"\bI\s+value\s+(.*?)",
    r"\bI\s+hate\s+when\s+(.*?)",
    r"\bit\s+bothers\s+me\s+when\s+(.*?)",
    r"\bit\s+annoys\s+me\s+when\s+(.*?)",
];

/// Compiled set of preference patterns
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    patterns: Vec<Regex>,
}

impl PatternExtractor {
    pub fn new() -> Self {
        let patterns = TRIGGERS
            .iter()
            .map(|trigger| {
                RegexBuilder::new(&format!("{}{}", trigger, CLAUSE_END))
                    .case_insensitive(true)
                    .build()
                    .expect("valid regex")
            })
            .collect();

        Self { patterns }
    }

    /// Returns every preference clause found in `text`, in pattern order.
    ///
    /// The same clause matched by two patterns is reported once.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let Some(clause) = caps.get(1) else {
                    continue;
                };
                let clause = clause.as_str().trim();
                if clause.chars().count() <= MIN_CAPTURE_CHARS {
                    continue;
                }
                if seen.insert(clause.to_lowercase()) {
                    found.push(clause.to_string());
                }
            }
        }

        found
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}
