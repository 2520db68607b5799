//! Generation configuration parameters

use serde::{Deserialize, Serialize};

/// Smallest thinking budget the Messages API accepts
pub const MIN_THINKING_BUDGET: u32 = 1024;

/// Extended thinking switch sent with every request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThinkingConfig {
    /// Stream reasoning deltas, capped at `budget_tokens`
    Enabled { budget_tokens: u32 },
    Disabled,
}

/// Parameters for controlling text generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Extended thinking mode
    pub thinking: ThinkingConfig,
}

impl GenerationConfig {
    /// Create a new configuration with the specified max tokens and thinking disabled
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            thinking: ThinkingConfig::Disabled,
        }
    }

    /// Enable extended thinking with the given budget
    pub fn with_thinking(mut self, budget_tokens: u32) -> Self {
        self.thinking = ThinkingConfig::Enabled { budget_tokens };
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(1024)
    }
}
