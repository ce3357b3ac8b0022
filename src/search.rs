//! Time-bounded iterative deepening minimax with alpha-beta pruning

use tracing::debug;

use std::time::Instant;

use crate::{board::*, config::SearchConfig, eval::evaluate, HEIGHT, WIDTH};

/// Per-search state threaded through the recursion
///
/// # Notes
/// Each move selection owns its context, so concurrent searches on different
/// games never share counters or boards.
#[derive(Debug, Clone)]
pub struct SearchContext {
    deadline: Option<Instant>,
    /// The number of nodes visited so far (for diagnostics only)
    pub nodes: u64,
}

impl SearchContext {
    /// Creates a context that aborts the search once `deadline` passes
    pub fn new(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            nodes: 0,
        }
    }

    /// Creates a context without a deadline
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            nodes: 0,
        }
    }

    fn expired(&self) -> bool {
        match self.deadline {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

/// Outcome of an iterative deepening search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Best column of the deepest completed pass, if any pass completed
    pub column: Option<usize>,
    /// Score of `column` from the searching player's perspective
    pub score: f64,
    /// Deepest completed depth
    pub depth: u32,
    /// Nodes visited across every pass, including an abandoned one
    pub nodes: u64,
}

/// Orders `columns` by a one-ply static evaluation for `mover`, best first.
/// Equal scores keep their original relative order.
pub fn ordered_moves(board: &Board, mover: Player, columns: &[usize]) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = columns
        .iter()
        .filter_map(|&column| {
            board
                .with_drop(column, mover)
                .map(|(next, _)| (column, evaluate(&next, mover)))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().map(|(column, _)| column).collect()
}

/// Performs the alpha-beta search below the root
///
/// Scores are always from `root`'s perspective: `root` maximizes, its opponent
/// minimizes. Returns `None` when the deadline passed, in which case the
/// whole pass must be discarded.
fn alphabeta(
    board: &Board,
    depth: u32,
    mut alpha: f64,
    mut beta: f64,
    maximizing: bool,
    root: Player,
    ctx: &mut SearchContext,
) -> Option<f64> {
    if ctx.expired() {
        return None;
    }
    ctx.nodes += 1;

    if depth == 0 || board.is_terminal() {
        return Some(evaluate(board, root));
    }

    let mover = if maximizing { root } else { root.other() };
    let columns: Vec<usize> = board.valid_moves().collect();

    let mut value = if maximizing {
        f64::NEG_INFINITY
    } else {
        f64::INFINITY
    };
    for column in ordered_moves(board, mover, &columns) {
        let next = match board.with_drop(column, mover) {
            Some((next, _)) => next,
            None => continue,
        };
        let score = alphabeta(&next, depth - 1, alpha, beta, !maximizing, root, ctx)?;

        if maximizing {
            value = value.max(score);
            alpha = alpha.max(value);
        } else {
            value = value.min(score);
            beta = beta.min(value);
        }
        // the other side will never allow this line, stop exploring it
        if alpha >= beta {
            break;
        }
    }
    Some(value)
}

/// Performs a full alpha-beta pass of `depth` plies for `root`, restricted to
/// `candidates` at the top level
///
/// Returns the score and best column, or `None` if the deadline passed
/// before the pass completed.
pub fn search_depth(
    board: &Board,
    root: Player,
    depth: u32,
    candidates: &[usize],
    ctx: &mut SearchContext,
) -> Option<(f64, Option<usize>)> {
    if ctx.expired() {
        return None;
    }
    ctx.nodes += 1;

    if depth == 0 || board.is_terminal() {
        return Some((evaluate(board, root), None));
    }

    let beta = f64::INFINITY;
    let mut alpha = f64::NEG_INFINITY;
    let mut best_score = f64::NEG_INFINITY;
    let mut best_move = None;
    for column in ordered_moves(board, root, candidates) {
        let next = match board.with_drop(column, root) {
            Some((next, _)) => next,
            None => continue,
        };
        let score = alphabeta(&next, depth - 1, alpha, beta, false, root, ctx)?;

        if best_move.is_none() || score > best_score {
            best_score = score;
            best_move = Some(column);
        }
        alpha = alpha.max(best_score);
    }

    Some((best_score, best_move))
}

/// Searches at increasing depth until `config.max_depth` or the time budget
/// runs out
///
/// Only passes that complete before the deadline are trusted: the result is
/// always the answer of the deepest completed pass.
pub fn iterative_deepening(
    board: &Board,
    root: Player,
    config: &SearchConfig,
    candidates: &[usize],
) -> SearchResult {
    let start = Instant::now();
    let mut ctx = SearchContext::new(start + config.time_budget);
    let empty_cells = (WIDTH * HEIGHT - board.piece_count()) as u32;

    let mut result = SearchResult {
        column: None,
        score: 0.0,
        depth: 0,
        nodes: 0,
    };

    for depth in 1..=config.max_depth {
        if start.elapsed() > config.time_budget {
            break;
        }

        match search_depth(board, root, depth, candidates, &mut ctx) {
            Some((score, Some(column))) => {
                debug!(depth, column, score, nodes = ctx.nodes, "search depth completed");
                result.column = Some(column);
                result.score = score;
                result.depth = depth;
            }
            Some((_, None)) => break,
            None => {
                debug!(depth, nodes = ctx.nodes, "search depth abandoned at deadline");
                break;
            }
        }

        // deeper passes can't see anything new once the board would be full
        if depth >= empty_cells {
            break;
        }
    }

    result.nodes = ctx.nodes;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::time::Duration;

    #[test]
    fn ordering_is_stable_for_ties() {
        // mirrored first moves score the same, inner columns score higher
        let board = Board::new();
        let order = ordered_moves(&board, Player::One, &[0, 6, 1, 5]);
        assert_eq!(order, vec![1, 5, 0, 6]);
    }

    #[test]
    fn depth_one_takes_the_win() -> Result<()> {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", "OOO....", "XXX....",
        ])?;
        let all: Vec<usize> = board.valid_moves().collect();
        let (score, column) =
            search_depth(&board, Player::One, 1, &all, &mut SearchContext::unbounded())
                .expect("unbounded search always completes");
        assert_eq!(column, Some(3));
        assert_eq!(score, crate::eval::WIN_SCORE);
        Ok(())
    }

    #[test]
    fn depth_two_sees_the_block() -> Result<()> {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", "X......", "XOOO..X",
        ])?;
        let all: Vec<usize> = board.valid_moves().collect();
        let (_, column) =
            search_depth(&board, Player::One, 2, &all, &mut SearchContext::unbounded())
                .expect("unbounded search always completes");
        assert_eq!(column, Some(4));
        Ok(())
    }

    #[test]
    fn expired_deadline_abandons_the_pass() {
        let board = Board::new();
        let all: Vec<usize> = board.valid_moves().collect();
        let mut ctx = SearchContext::new(Instant::now());
        assert_eq!(search_depth(&board, Player::One, 3, &all, &mut ctx), None);
        assert_eq!(ctx.nodes, 0);
    }

    #[test]
    fn iterative_deepening_counts_nodes_across_passes() -> Result<()> {
        let board = Board::from_moves("3322")?;
        let config = SearchConfig::basic()
            .with_max_depth(3)
            .with_time_budget(Duration::from_secs(60));
        let all: Vec<usize> = board.valid_moves().collect();
        let result = iterative_deepening(&board, Player::One, &config, &all);
        assert_eq!(result.depth, 3);
        assert!(result.column.is_some());

        let mut single = SearchContext::unbounded();
        search_depth(&board, Player::One, 3, &all, &mut single);
        assert!(result.nodes > single.nodes);
        Ok(())
    }
}
