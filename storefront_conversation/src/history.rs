//! Context window policy.
//!
//! Decides which suffix of the [`ConversationContext`] travels with each
//! request.

use serde::{Deserialize, Serialize};
use storefront_core::{Role, Turn};

use crate::context::ConversationContext;

/// Configuration for the context window sent to the assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of turns sent with each request
    #[serde(default = "HistoryConfig::default_max_turns")]
    pub max_turns: usize,
    /// Optional cap on the total characters of the window
    #[serde(default)]
    pub max_chars: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: Self::default_max_turns(),
            max_chars: None,
        }
    }
}

impl HistoryConfig {
    const fn default_max_turns() -> usize {
        5
    }

    #[must_use]
    pub const fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    #[must_use]
    pub const fn with_max_chars(mut self, max: usize) -> Self {
        self.max_chars = Some(max);
        self
    }
}

/// Selects the turns to send for the next request.
#[derive(Debug, Clone, Default)]
pub struct HistoryWindow {
    config: HistoryConfig,
}

impl HistoryWindow {
    #[must_use]
    pub const fn with_config(config: HistoryConfig) -> Self {
        Self { config }
    }

    /// Apply the window policy to `context`.
    ///
    /// Takes `context.window(max_turns)` and, when a character cap is set,
    /// drops the oldest turns until the rest fits. The newest turn is always
    /// kept. Order stays chronological.
    #[must_use]
    pub fn select(&self, context: &ConversationContext) -> Vec<Turn> {
        let window = context.window(self.config.max_turns);
        let Some(max_chars) = self.config.max_chars else {
            return window.to_vec();
        };

        let mut total: usize = window.iter().map(|t| t.content.chars().count()).sum();
        let mut start = 0;
        while window.len() - start > 1 && total > max_chars {
            total -= window[start].content.chars().count();
            start += 1;
        }

        window[start..].to_vec()
    }

    #[must_use]
    pub const fn config(&self) -> &HistoryConfig {
        &self.config
    }
}

/// Statistics about a conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryStats {
    pub total_turns: usize,
    pub user_turns: usize,
    pub assistant_turns: usize,
    pub total_characters: usize,
    pub estimated_tokens: usize,
}

impl HistoryStats {
    #[must_use]
    pub fn of(context: &ConversationContext) -> Self {
        let turns = context.turns();
        let total_characters: usize = turns.iter().map(|t| t.content.chars().count()).sum();

        Self {
            total_turns: turns.len(),
            user_turns: turns.iter().filter(|t| t.role == Role::User).count(),
            assistant_turns: turns.iter().filter(|t| t.role == Role::Assistant).count(),
            total_characters,
            estimated_tokens: total_characters / 4, // Rough estimate: 4 chars per token
        }
    }
}
