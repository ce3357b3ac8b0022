//! Per-mode search configuration, resolved once when a game's mode is set

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use std::time::Duration;

use crate::game::GameMode;

/// Knobs controlling how hard the AI thinks and which shortcuts it takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Deepest iterative-deepening pass to attempt
    pub max_depth: u32,
    /// Wall-clock budget for a single move selection
    pub time_budget: Duration,
    /// The opening book is consulted while at most this many pieces are placed
    pub opening_threshold: usize,
    /// Enables the bottom-row and unsafe-column defensive patterns
    pub special_defense: bool,
}

impl SearchConfig {
    /// Used for hints in two player games
    pub fn hint() -> Self {
        Self {
            max_depth: 5,
            time_budget: Duration::from_millis(3000),
            opening_threshold: 6,
            special_defense: false,
        }
    }

    /// The single player opponent
    pub fn basic() -> Self {
        Self {
            max_depth: 7,
            time_budget: Duration::from_millis(5000),
            opening_threshold: 6,
            special_defense: false,
        }
    }

    /// Both seats of an AI vs AI game
    pub fn advanced() -> Self {
        Self {
            max_depth: 9,
            time_budget: Duration::from_millis(7000),
            opening_threshold: 8,
            special_defense: true,
        }
    }

    pub fn for_mode(mode: GameMode) -> Self {
        match mode {
            GameMode::TwoPlayer => Self::hint(),
            GameMode::SingleVsAi => Self::basic(),
            GameMode::AiVsAi => Self::advanced(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_time_budget(mut self, time_budget: Duration) -> Self {
        self.time_budget = time_budget;
        self
    }

    pub fn with_opening_threshold(mut self, opening_threshold: usize) -> Self {
        self.opening_threshold = opening_threshold;
        self
    }

    pub fn with_special_defense(mut self, special_defense: bool) -> Self {
        self.special_defense = special_defense;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(anyhow!("max_depth must be at least 1"));
        }
        if self.time_budget.is_zero() {
            return Err(anyhow!("time_budget must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::basic()
    }
}
