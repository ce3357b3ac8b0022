use serde::{Deserialize, Serialize};

use std::convert::TryFrom;
use std::fmt;

/// Why the AI picked the column it did
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Rationale {
    ImmediateWinOrBlock,
    OpeningBook,
    SpecialDefense,
    /// Full search, with the deepest completed depth
    Minimax(u32),
    FallbackCenter,
}

impl fmt::Display for Rationale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rationale::ImmediateWinOrBlock => write!(f, "immediate-win-or-block"),
            Rationale::OpeningBook => write!(f, "opening-book"),
            Rationale::SpecialDefense => write!(f, "special-defense"),
            Rationale::Minimax(depth) => write!(f, "minimax-depth-{}", depth),
            Rationale::FallbackCenter => write!(f, "fallback-center"),
        }
    }
}

impl From<Rationale> for String {
    fn from(rationale: Rationale) -> String {
        rationale.to_string()
    }
}

impl TryFrom<String> for Rationale {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        match tag.as_str() {
            "immediate-win-or-block" => Ok(Rationale::ImmediateWinOrBlock),
            "opening-book" => Ok(Rationale::OpeningBook),
            "special-defense" => Ok(Rationale::SpecialDefense),
            "fallback-center" => Ok(Rationale::FallbackCenter),
            _ => tag
                .strip_prefix("minimax-depth-")
                .and_then(|depth| depth.parse().ok())
                .map(Rationale::Minimax)
                .ok_or_else(|| format!("unknown rationale '{}'", tag)),
        }
    }
}

/// Diagnostics for a single AI decision. Never feeds back into move choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetrics {
    pub elapsed_ms: u64,
    /// Deepest fully completed search depth, 0 when a shortcut decided
    pub depth_reached: u32,
    /// Nodes visited across every iterative deepening pass
    pub nodes: u64,
    pub column: usize,
    pub rationale: Rationale,
}
