//! Retrieval and generation settings.

use docchat_core::config::{DEFAULT_MAX_CONTEXTS, DEFAULT_MIN_RELEVANCE_SCORE};
use docchat_core::DocChatConfig;

/// Prior turns forwarded to the model.
pub const DEFAULT_MAX_HISTORY_TURNS: usize = 10;

#[derive(Debug, Clone)]
pub struct AnswerSettings {
    /// Matches scoring below this are discarded.
    pub min_relevance_score: f32,
    pub max_contexts: usize,
    pub max_history_turns: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            min_relevance_score: DEFAULT_MIN_RELEVANCE_SCORE,
            max_contexts: DEFAULT_MAX_CONTEXTS,
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
        }
    }
}

impl From<&DocChatConfig> for AnswerSettings {
    fn from(config: &DocChatConfig) -> Self {
        Self {
            min_relevance_score: config.min_relevance_score,
            max_contexts: config.max_contexts,
            ..Self::default()
        }
    }
}
