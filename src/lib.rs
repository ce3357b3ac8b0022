//! Game sessions and a computer opponent for the board game 'Connect 4'
//!
//! A [`Game`] owns the board and the game phase. The AI picks its move with a
//! layered approach: immediate wins and blocks, defensive patterns and an
//! opening book, then a time-bounded iterative deepening alpha-beta search
//! over a hand-tuned static evaluation.
//!
//! # Basic Usage
//!
//! ```
//! use connect4_session::{Game, GameMode, GameStatus};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut game = Game::new("lion-moon-kite");
//! game.set_mode(GameMode::SingleVsAi)?;
//! game.apply_move(0)?;
//!
//! // the AI answers in the center
//! let column = game.select_ai_move(None);
//! assert_eq!(column, Some(3));
//!
//! let snapshot = game.apply_move(3)?;
//! assert_eq!(snapshot.status, GameStatus::Playing);
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod board;

pub mod error;

pub mod config;

pub mod eval;

pub mod tactics;

pub mod search;

pub mod metrics;

pub mod agent;

pub mod game;

pub mod snapshot;

pub mod registry;

mod test;

pub use board::{Board, Cell, Player};
pub use config::SearchConfig;
pub use error::{InvalidModeTransition, InvalidMove, RegistryError, SnapshotError};
pub use game::{Game, GameMode, GameStatus, LastMove, Winner};
pub use metrics::{Rationale, SearchMetrics};
pub use registry::GameRegistry;
pub use snapshot::Snapshot;

/// The width of the game board in tiles
pub const WIDTH: usize = 7;

/// The height of the game board in tiles
pub const HEIGHT: usize = 6;

// lines of four must fit on the board, and coordinates must fit in a byte for the binary frame
const_assert!(WIDTH >= 4 && HEIGHT >= 4);
const_assert!(WIDTH <= u8::MAX as usize && HEIGHT <= u8::MAX as usize);
const_assert_eq!(board::NUM_WINDOWS, 69);
