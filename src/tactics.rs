//! Cheap checks run before the full search: immediate wins and blocks,
//! bottom-row defense and the opening book

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, Player};
use crate::{HEIGHT, WIDTH};

/// Returns the columns ordered from the middle outwards, left before right,
/// as the middle columns are usually the better moves
pub const fn center_first() -> [usize; WIDTH] {
    let mut order = [0; WIDTH];
    let mut i = 0;
    while i < WIDTH {
        order[i] = (WIDTH / 2) + (1 - i % 2) * (i / 2) - (i % 2) * (i / 2 + 1);
        i += 1;
    }
    order
}

/// Playable columns in center-first order
pub fn candidate_columns(board: &Board) -> Vec<usize> {
    center_first()
        .iter()
        .copied()
        .filter(|&column| board.playable(column))
        .collect()
}

/// First column in which `player` completes a line
pub fn immediate_win(board: &Board, player: Player) -> Option<usize> {
    board
        .valid_moves()
        .find(|&column| board.wins_by_dropping(column, player))
}

/// First column in which the opponent of `player` would complete a line
pub fn immediate_block(board: &Board, player: Player) -> Option<usize> {
    immediate_win(board, player.other())
}

/// Columns, center-first, that don't hand the opponent a win on the cell
/// directly above the dropped piece
pub fn safe_columns(board: &Board, player: Player) -> Vec<usize> {
    let opponent = player.other();
    candidate_columns(board)
        .into_iter()
        .filter(|&column| match board.with_drop(column, player) {
            Some((next, _)) => !next.wins_by_dropping(column, opponent),
            None => false,
        })
        .collect()
}

/// Defensive patterns for the bottom row, and forced play when only one
/// column is safe
pub fn special_defense(board: &Board, player: Player) -> Option<usize> {
    let bottom = HEIGHT - 1;
    let opponent = player.other().cell();
    let center = WIDTH / 2;

    // two of the three center bottom cells taken by the opponent
    let center_slots = [center - 1, center, center + 1];
    let taken = center_slots
        .iter()
        .filter(|&&col| board.get(bottom, col) == opponent)
        .count();
    if taken == 2 {
        if let Some(&open) = center_slots
            .iter()
            .find(|&&col| board.get(bottom, col).is_empty())
        {
            return Some(open);
        }
    }

    // three in a row anywhere on the bottom row, block an open end
    for start in 0..=WIDTH - 3 {
        if (start..start + 3).all(|col| board.get(bottom, col) == opponent) {
            if start > 0 && board.get(bottom, start - 1).is_empty() {
                return Some(start - 1);
            }
            if start + 3 < WIDTH && board.get(bottom, start + 3).is_empty() {
                return Some(start + 3);
            }
        }
    }

    let safe = safe_columns(board, player);
    if safe.len() == 1 && board.valid_moves().count() > 1 {
        return Some(safe[0]);
    }

    None
}

/// Opening play while at most `threshold` pieces are on the board.
///
/// Only columns in `candidates` are ever returned. `rng` breaks the tie
/// between the two columns next to an opponent-held center.
pub fn opening_book<R: Rng + ?Sized>(
    board: &Board,
    player: Player,
    threshold: usize,
    candidates: &[usize],
    rng: &mut R,
) -> Option<usize> {
    if board.piece_count() > threshold {
        return None;
    }

    let bottom = HEIGHT - 1;
    let center = WIDTH / 2;
    let (left, right) = (center - 1, center + 1);
    let opponent = player.other();
    let allowed = |column: usize| candidates.contains(&column);

    match board.get(bottom, center).owner() {
        None if allowed(center) => return Some(center),
        Some(owner) if owner == opponent => {
            let adjacent: Vec<usize> = [left, right]
                .iter()
                .copied()
                .filter(|&column| allowed(column))
                .collect();
            if let Some(&column) = adjacent.choose(rng) {
                return Some(column);
            }
        }
        Some(_) => {
            // balance an opponent piece next to our center
            let left_taken = board.get(bottom, left).owner() == Some(opponent);
            let right_taken = board.get(bottom, right).owner() == Some(opponent);
            if left_taken != right_taken {
                let opposite = if left_taken { right } else { left };
                if allowed(opposite) {
                    return Some(opposite);
                }
            }
        }
        None => {}
    }

    center_first()
        .iter()
        .copied()
        .filter(|&column| column != 0 && column != WIDTH - 1)
        .find(|&column| allowed(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn center_first_order() {
        assert_eq!(center_first(), [3, 2, 4, 1, 5, 0, 6]);
    }

    #[test]
    fn finds_immediate_win_and_block() -> Result<()> {
        let board = Board::from_rows([
            ".......", ".......", ".......", "......O", "......O", "XXX...O",
        ])?;
        assert_eq!(immediate_win(&board, Player::One), Some(3));
        assert_eq!(immediate_block(&board, Player::One), Some(6));
        assert_eq!(immediate_win(&board, Player::Two), Some(6));
        assert_eq!(immediate_block(&board, Player::Two), Some(3));

        // O's cell at (4, 3) isn't reachable until (5, 3) is filled
        let unsupported = Board::from_rows([
            ".......", ".......", ".......", ".......", "OOO....", "XXX....",
        ])?;
        assert_eq!(immediate_win(&unsupported, Player::Two), None);
        assert_eq!(immediate_win(&Board::new(), Player::One), None);
        Ok(())
    }

    #[test]
    fn blocks_the_remaining_center_slot() -> Result<()> {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", ".......", "..O.OX.",
        ])?;
        assert_eq!(special_defense(&board, Player::One), Some(3));
        Ok(())
    }

    #[test]
    fn blocks_an_open_end_of_a_bottom_three() -> Result<()> {
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", ".......", ".OOO...",
        ])?;
        let column = special_defense(&board, Player::One);
        assert!(column == Some(0) || column == Some(4));
        Ok(())
    }

    #[test]
    fn avoids_columns_under_an_opponent_win() -> Result<()> {
        // O wins at (4, 3) once something supports it
        let board = Board::from_rows([
            ".......", ".......", ".......", ".......", "OOO....", "XXO.X..",
        ])?;
        let safe = safe_columns(&board, Player::One);
        assert!(!safe.contains(&3));
        assert_eq!(safe.len(), 6);
        Ok(())
    }

    #[test]
    fn opening_prefers_center() {
        let mut rng = StdRng::seed_from_u64(7);
        let all = candidate_columns(&Board::new());
        assert_eq!(
            opening_book(&Board::new(), Player::One, 6, &all, &mut rng),
            Some(3)
        );
    }

    #[test]
    fn opening_answers_center_with_an_adjacent_column() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::from_moves("3")?;
        let all = candidate_columns(&board);
        let column = opening_book(&board, Player::Two, 6, &all, &mut rng);
        assert!(column == Some(2) || column == Some(4));
        Ok(())
    }

    #[test]
    fn opening_balances_an_adjacent_reply() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::from_moves("32")?;
        let all = candidate_columns(&board);
        assert_eq!(opening_book(&board, Player::One, 6, &all, &mut rng), Some(4));
        Ok(())
    }

    #[test]
    fn opening_ends_after_the_threshold() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::from_moves("3241562")?;
        let all = candidate_columns(&board);
        assert_eq!(opening_book(&board, Player::Two, 6, &all, &mut rng), None);
        assert!(opening_book(&board, Player::Two, 8, &all, &mut rng).is_some());
        Ok(())
    }
}
