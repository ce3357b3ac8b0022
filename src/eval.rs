//! Static evaluation of a position from one player's point of view
//!
//! The score is built up in layers: decided positions short-circuit to
//! [`WIN_SCORE`], otherwise every window is scored, then positional bonuses,
//! a penalty for tokens that prop up an opponent's winning cell, and finally
//! fork and trap-setup terms from a one- and two-ply lookahead.

use crate::board::{Board, Cell, Player, WINDOWS};
use crate::{HEIGHT, WIDTH};

/// Score of a position that is already won
pub const WIN_SCORE: f64 = 10000.0;

const CRITICAL_BLOCK: f64 = -50.0;
const OPPONENT_TWO: f64 = -8.0;
const OWN_THREE: f64 = 25.0;
const OWN_TWO: f64 = 7.0;
const OWN_ONE: f64 = 1.0;

const CENTER_BONUS: f64 = 10.0;
const ADJACENT_BONUS: f64 = 5.0;
const EDGE_PENALTY: f64 = 2.0;
const HEIGHT_BONUS: f64 = 0.5;

const TRAP_PENALTY: f64 = 30.0;
const OWN_FORK: f64 = 15.0;
const OPPONENT_FORK: f64 = 20.0;
const TRAP_SETUP: f64 = 8.0;

/// Scores `board` for `player`, positive values favour `player`
pub fn evaluate(board: &Board, player: Player) -> f64 {
    match board.winner() {
        Some(winner) if winner == player => return WIN_SCORE,
        Some(_) => return -WIN_SCORE,
        None => {}
    }

    let opponent = player.other();

    window_score(board, player)
        + positional_score(board, player)
        - trap_penalty(board, player)
        + fork_count(board, player) as f64 * OWN_FORK
        - fork_count(board, opponent) as f64 * OPPONENT_FORK
        + trap_setups(board, player) as f64 * TRAP_SETUP
}

fn window_score(board: &Board, player: Player) -> f64 {
    let own_cell = player.cell();
    let mut score = 0.0;

    for window in WINDOWS.iter() {
        let mut own = 0;
        let mut opp = 0;
        let mut empty = 0;
        for &(row, col) in window.iter() {
            match board.get(row, col) {
                Cell::Empty => empty += 1,
                c if c == own_cell => own += 1,
                _ => opp += 1,
            }
        }

        score += if opp > 0 {
            match (opp, empty) {
                (3, 1) => CRITICAL_BLOCK,
                (2, 2) => OPPONENT_TWO,
                _ => 0.0,
            }
        } else {
            match own {
                3 => OWN_THREE,
                2 => OWN_TWO,
                1 => OWN_ONE,
                _ => 0.0,
            }
        };
    }
    score
}

fn positional_score(board: &Board, player: Player) -> f64 {
    let own_cell = player.cell();
    let center = WIDTH / 2;
    let mut score = 0.0;
    let mut edge_counts = [0usize; 2];

    for (row, cells) in board.rows().iter().enumerate() {
        for (col, &cell) in cells.iter().enumerate() {
            if cell != own_cell {
                continue;
            }
            if col == center {
                score += CENTER_BONUS;
            } else if col + 1 == center || col == center + 1 {
                score += ADJACENT_BONUS;
            } else if col == 0 {
                edge_counts[0] += 1;
            } else if col == WIDTH - 1 {
                edge_counts[1] += 1;
            }
            // lower rows are more stable
            score += HEIGHT_BONUS * (row + 1) as f64;
        }
    }

    for &count in edge_counts.iter() {
        score -= EDGE_PENALTY * count.saturating_sub(1) as f64;
    }
    score
}

/// Penalty for tokens whose empty cell directly above completes an opponent line
fn trap_penalty(board: &Board, player: Player) -> f64 {
    let own_cell = player.cell();
    let opponent = player.other();
    let mut penalty = 0.0;

    for row in 1..HEIGHT {
        for col in 0..WIDTH {
            if board.get(row, col) == own_cell
                && board.get(row - 1, col).is_empty()
                && board.wins_by_dropping(col, opponent)
            {
                penalty += TRAP_PENALTY;
            }
        }
    }
    penalty
}

/// Counts the columns where a drop by `player` opens two or more threes at once
pub fn fork_count(board: &Board, player: Player) -> usize {
    board
        .valid_moves()
        .filter(|&column| match board.with_drop(column, player) {
            Some((next, row)) => threats_through(&next, row, column, player) >= 2,
            None => false,
        })
        .count()
}

/// Number of windows through `(row, col)` holding three of `player`'s tokens and one empty cell
fn threats_through(board: &Board, row: usize, col: usize, player: Player) -> usize {
    let own_cell = player.cell();
    WINDOWS
        .iter()
        .filter(|window| window.contains(&(row, col)))
        .filter(|window| {
            let own = window
                .iter()
                .filter(|&&(r, c)| board.get(r, c) == own_cell)
                .count();
            let empty = window
                .iter()
                .filter(|&&(r, c)| board.get(r, c).is_empty())
                .count();
            own == 3 && empty == 1
        })
        .count()
}

/// Counts, over every move by `player` and every reply by the opponent, the
/// replies that leave `player` an immediate winning drop
pub fn trap_setups(board: &Board, player: Player) -> usize {
    let opponent = player.other();
    let mut count = 0;

    for column in board.valid_moves() {
        let (next, row) = match board.with_drop(column, player) {
            Some(drop) => drop,
            None => continue,
        };
        // an outright win is not a setup
        if next.is_winning_placement(row, column) {
            continue;
        }

        for reply in next.valid_moves() {
            let (after, reply_row) = match next.with_drop(reply, opponent) {
                Some(drop) => drop,
                None => continue,
            };
            if after.is_winning_placement(reply_row, reply) {
                continue;
            }
            if after.valid_moves().any(|c| after.wins_by_dropping(c, player)) {
                count += 1;
            }
        }
    }
    count
}
