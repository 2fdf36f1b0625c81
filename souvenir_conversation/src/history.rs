//! Conversation history management.
//!
//! The history window decides which earlier turns are replayed in the
//! prompt: the most recent ones, bounded by count and by size.

use souvenir_core::{ChatMessage, Role};

/// Limits applied to replayed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of messages to replay
    pub max_messages: usize,
    /// Maximum characters across replayed messages
    pub max_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            max_chars: 6000,
        }
    }
}

impl HistoryConfig {
    #[must_use]
    pub const fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    #[must_use]
    pub const fn with_max_chars(mut self, max: usize) -> Self {
        self.max_chars = max;
        self
    }
}

/// A sliding window over conversation history.
#[derive(Debug, Clone, Default)]
pub struct HistoryWindow {
    config: HistoryConfig,
}

impl HistoryWindow {
    #[must_use]
    pub const fn with_config(config: HistoryConfig) -> Self {
        Self { config }
    }

    /// Window that replays nothing.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::with_config(HistoryConfig {
            max_messages: 0,
            max_chars: 0,
        })
    }

    /// Select the user and assistant messages to replay, oldest dropped
    /// first. System messages never enter the window.
    #[must_use]
    pub fn select_messages(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let turns: Vec<&ChatMessage> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .collect();

        let start = turns.len().saturating_sub(self.config.max_messages);
        self.apply_char_limit(&turns[start..])
    }

    /// Walk back from the newest message until the size budget is spent.
    fn apply_char_limit(&self, messages: &[&ChatMessage]) -> Vec<ChatMessage> {
        let mut total_chars = 0_usize;
        let mut kept = 0_usize;

        for message in messages.iter().rev() {
            let len = message.content.chars().count();
            if total_chars + len > self.config.max_chars {
                break;
            }
            total_chars += len;
            kept += 1;
        }

        messages[messages.len() - kept..]
            .iter()
            .map(|m| (*m).clone())
            .collect()
    }

    #[must_use]
    pub const fn config(&self) -> &HistoryConfig {
        &self.config
    }
}
