use rand::seq::SliceRandom;
use std::collections::HashSet;

/// Openers that invite the user to tell a story
pub const STORY_PROMPTS: [&str; 10] = [
    "What's a favorite memory from your childhood?",
    "Tell me about a place you've visited that left an impression on you.",
    "What's something you're looking forward to in the near future?",
    "What's a hobby or activity that brings you joy?",
    "Tell me about a book, movie, or show that you enjoyed recently.",
    "What's a typical day like for you?",
    "What's something you're passionate about?",
    "What's a challenge you've overcome that you're proud of?",
    "If you could travel anywhere, where would you go and why?",
    "What's your ideal way to spend a free day?",
];

/// Hands out story prompts at random without repeats until all have been used
#[derive(Debug, Default)]
pub struct StoryPrompter {
    used: HashSet<&'static str>,
}

impl StoryPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_prompt(&mut self) -> &'static str {
        let mut available: Vec<&'static str> = STORY_PROMPTS
            .iter()
            .copied()
            .filter(|p| !self.used.contains(p))
            .collect();

        if available.is_empty() {
            self.used.clear();
            available = STORY_PROMPTS.to_vec();
        }

        let prompt = available
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(STORY_PROMPTS[0]);
        self.used.insert(prompt);
        prompt
    }

    pub fn remaining(&self) -> usize {
        STORY_PROMPTS.len() - self.used.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_repeats_within_a_cycle() {
        let mut prompter = StoryPrompter::new();
        let cycle: HashSet<_> = (0..STORY_PROMPTS.len())
            .map(|_| prompter.next_prompt())
            .collect();

        assert_eq!(cycle.len(), STORY_PROMPTS.len());
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_resets_after_exhaustion() {
        let mut prompter = StoryPrompter::new();
        for _ in 0..STORY_PROMPTS.len() {
            prompter.next_prompt();
        }

        let next = prompter.next_prompt();
        assert!(STORY_PROMPTS.contains(&next));
        assert_eq!(prompter.remaining(), STORY_PROMPTS.len() - 1);
    }
}
