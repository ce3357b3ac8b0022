//! Chooses the AI's column: tactical shortcuts first, then the full search,
//! then a center-first fallback

use rand::Rng;
use tracing::info;

use std::time::Instant;

use crate::{
    board::{Board, Player},
    config::SearchConfig,
    metrics::{Rationale, SearchMetrics},
    search, tactics,
};

/// A chosen column together with how it was found
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub column: usize,
    pub score: Option<f64>,
    pub metrics: SearchMetrics,
}

/// Selects a column for `player`, or `None` if the board has no valid moves
pub fn select_move(board: &Board, player: Player, config: &SearchConfig) -> Option<Decision> {
    select_move_with_rng(board, player, config, &mut rand::thread_rng())
}

/// As [`select_move`], with the RNG used to break ties in the opening book
pub fn select_move_with_rng<R: Rng + ?Sized>(
    board: &Board,
    player: Player,
    config: &SearchConfig,
    rng: &mut R,
) -> Option<Decision> {
    let start = Instant::now();
    let mut candidates = tactics::candidate_columns(board);
    if candidates.is_empty() {
        return None;
    }

    let decide = |column: usize, depth: u32, nodes: u64, score: Option<f64>, rationale| {
        let metrics = SearchMetrics {
            elapsed_ms: start.elapsed().as_millis() as u64,
            depth_reached: depth,
            nodes,
            column,
            rationale,
        };
        info!(
            %player,
            column,
            rationale = %metrics.rationale,
            depth,
            nodes,
            elapsed_ms = metrics.elapsed_ms,
            "AI move selected"
        );
        Some(Decision {
            column,
            score,
            metrics,
        })
    };

    if let Some(column) = tactics::immediate_win(board, player)
        .or_else(|| tactics::immediate_block(board, player))
    {
        return decide(column, 0, 0, None, Rationale::ImmediateWinOrBlock);
    }

    if config.special_defense {
        if let Some(column) = tactics::special_defense(board, player) {
            return decide(column, 0, 0, None, Rationale::SpecialDefense);
        }
        let safe = tactics::safe_columns(board, player);
        if !safe.is_empty() {
            candidates = safe;
        }
    }

    if let Some(column) =
        tactics::opening_book(board, player, config.opening_threshold, &candidates, rng)
    {
        return decide(column, 0, 0, None, Rationale::OpeningBook);
    }

    let result = search::iterative_deepening(board, player, config, &candidates);
    match result.column {
        Some(column) => decide(
            column,
            result.depth,
            result.nodes,
            Some(result.score),
            Rationale::Minimax(result.depth),
        ),
        // candidates are already center-first
        None => decide(
            candidates[0],
            0,
            result.nodes,
            None,
            Rationale::FallbackCenter,
        ),
    }
}
