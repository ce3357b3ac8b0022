#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::time::Duration;

    use crate::eval::evaluate;
    use crate::search::{iterative_deepening, ordered_moves, search_depth, SearchContext};
    use crate::{
        agent, Board, Game, GameMode, GameStatus, Player, Rationale, SearchConfig, Snapshot,
        Winner, HEIGHT, WIDTH,
    };

    /// Plays up to `max_moves` random legal moves, stopping early if the game ends
    fn random_board(rng: &mut StdRng, max_moves: usize) -> (Board, Player) {
        let mut board = Board::new();
        let mut player = Player::One;
        for _ in 0..max_moves {
            if board.is_terminal() {
                break;
            }
            let moves: Vec<usize> = board.valid_moves().collect();
            let column = moves[rng.gen_range(0..moves.len())];
            board.drop_piece(column, player);
            player = player.other();
        }
        (board, player)
    }

    fn minimax(board: &Board, depth: u32, maximizing: bool, root: Player) -> f64 {
        if depth == 0 || board.is_terminal() {
            return evaluate(board, root);
        }
        let mover = if maximizing { root } else { root.other() };
        let columns: Vec<usize> = board.valid_moves().collect();
        let scores = ordered_moves(board, mover, &columns).into_iter().map(|column| {
            let (next, _) = board.with_drop(column, mover).expect("valid move");
            minimax(&next, depth - 1, !maximizing, root)
        });
        if maximizing {
            scores.fold(f64::NEG_INFINITY, f64::max)
        } else {
            scores.fold(f64::INFINITY, f64::min)
        }
    }

    fn minimax_root(board: &Board, depth: u32, root: Player) -> (f64, Option<usize>) {
        let columns: Vec<usize> = board.valid_moves().collect();
        let mut best = (f64::NEG_INFINITY, None);
        for column in ordered_moves(board, root, &columns) {
            let (next, _) = board.with_drop(column, root).expect("valid move");
            let score = minimax(&next, depth - 1, false, root);
            if best.1.is_none() || score > best.0 {
                best = (score, Some(column));
            }
        }
        best
    }

    #[test]
    pub fn placed_tokens_match_accepted_moves() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);

        for game_index in 0..100 {
            let mut game = Game::new(format!("random-{}", game_index));
            game.set_mode(GameMode::TwoPlayer)?;
            let mut accepted = 0;

            for _ in 0..120 {
                // include out of range columns
                let column = rng.gen_range(0..WIDTH + 2);
                let finished = game.status() == GameStatus::Finished;
                if game.apply_move(column).is_ok() {
                    assert!(!finished, "move accepted after the game finished");
                    accepted += 1;
                }
                assert_eq!(game.board().piece_count(), accepted);
                assert!(accepted <= WIDTH * HEIGHT);
            }

            if game.status() == GameStatus::Finished {
                assert_ne!(game.winner(), Winner::None);
            } else {
                assert_eq!(game.winner(), Winner::None);
            }
        }
        Ok(())
    }

    #[test]
    pub fn anchored_and_window_scan_agree() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let mut board = Board::new();
            let mut player = Player::One;

            while board.winner().is_none() && !board.is_full() {
                let moves: Vec<usize> = board.valid_moves().collect();
                let column = moves[rng.gen_range(0..moves.len())];
                let row = board.drop_piece(column, player).expect("valid move");

                // the previous position had no winner, so only the last piece can have won
                assert_eq!(
                    board.is_winning_placement(row, column),
                    board.winner() == Some(player)
                );

                let any_anchored = (0..HEIGHT)
                    .flat_map(|r| (0..WIDTH).map(move |c| (r, c)))
                    .any(|(r, c)| board.is_winning_placement(r, c));
                assert_eq!(any_anchored, board.winner().is_some());

                player = player.other();
            }
        }
    }

    #[test]
    pub fn alphabeta_matches_minimax() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(1234);
        let mut checked = 0;

        while checked < 12 {
            let moves = rng.gen_range(6..16);
            let (board, to_move) = random_board(&mut rng, moves);
            if board.is_terminal() {
                continue;
            }

            let all: Vec<usize> = board.valid_moves().collect();
            let pruned = search_depth(&board, to_move, 3, &all, &mut SearchContext::unbounded())
                .ok_or_else(|| anyhow!("unbounded search abandoned"))?;
            let exhaustive = minimax_root(&board, 3, to_move);

            assert_eq!(pruned.1, exhaustive.1);
            assert_eq!(pruned.0, exhaustive.0);
            checked += 1;
        }
        Ok(())
    }

    #[test]
    pub fn timed_out_depth_is_discarded() -> Result<()> {
        let board = Board::from_moves("32415623")?;
        let config = SearchConfig::advanced()
            .with_max_depth((WIDTH * HEIGHT) as u32)
            .with_time_budget(Duration::from_millis(60));
        let all: Vec<usize> = board.valid_moves().collect();

        let result = iterative_deepening(&board, Player::One, &config, &all);
        assert!(result.depth >= 1);
        assert!((result.depth as usize) < WIDTH * HEIGHT - board.piece_count());

        let (score, column) = search_depth(
            &board,
            Player::One,
            result.depth,
            &all,
            &mut SearchContext::unbounded(),
        )
        .ok_or_else(|| anyhow!("unbounded search abandoned"))?;
        assert_eq!(result.column, column);
        assert_eq!(result.score, score);
        Ok(())
    }

    #[test]
    pub fn winning_drop_skips_the_search() -> Result<()> {
        let mut game = Game::new("shortcut");
        game.set_mode(GameMode::AiVsAi)?;
        for &col in [0, 0, 1, 1, 2, 2].iter() {
            game.apply_move(col)?;
        }

        assert_eq!(game.select_ai_move(None), Some(3));
        let metrics = game
            .last_metrics()
            .ok_or_else(|| anyhow!("no metrics recorded"))?;
        assert_eq!(metrics.rationale, Rationale::ImmediateWinOrBlock);
        assert_eq!(metrics.nodes, 0);
        assert_eq!(metrics.depth_reached, 0);
        Ok(())
    }

    #[test]
    pub fn empty_board_opens_in_the_center() -> Result<()> {
        for &mode in [GameMode::TwoPlayer, GameMode::SingleVsAi, GameMode::AiVsAi].iter() {
            let mut game = Game::new("center");
            game.set_mode(mode)?;
            assert_eq!(game.select_ai_move(None), Some(3));
        }
        Ok(())
    }

    #[test]
    pub fn fallback_is_center_first() -> Result<()> {
        let board = Board::from_moves("32415623")?;
        let config = SearchConfig::basic().with_time_budget(Duration::from_nanos(1));
        let decision =
            agent::select_move(&board, Player::One, &config).ok_or_else(|| anyhow!("no move"))?;
        assert_eq!(decision.column, 3);
        assert_eq!(decision.metrics.rationale, Rationale::FallbackCenter);
        assert_eq!(decision.metrics.depth_reached, 0);
        Ok(())
    }

    #[test]
    pub fn bottom_row_three_is_blocked() -> Result<()> {
        let board = Board::from_rows([
            ".......", ".......", ".......", "..X....", "..X....", ".OOOX..",
        ])?;
        // the right end is already closed
        for config in [SearchConfig::basic(), SearchConfig::advanced()].iter() {
            let decision = agent::select_move(&board, Player::One, config)
                .ok_or_else(|| anyhow!("no move"))?;
            assert_eq!(decision.column, 0);
        }

        let open = Board::from_rows([
            ".......", ".......", ".......", ".......", ".......", ".OOO...",
        ])?;
        for config in [SearchConfig::basic(), SearchConfig::advanced()].iter() {
            let decision =
                agent::select_move(&open, Player::One, config).ok_or_else(|| anyhow!("no move"))?;
            assert!(decision.column == 0 || decision.column == 4);
        }
        Ok(())
    }

    #[test]
    pub fn snapshots_survive_transport() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(99);

        for game_index in 0..50 {
            let mut game = Game::new(format!("transport-{}", game_index));
            game.set_mode(GameMode::TwoPlayer)?;
            let moves = rng.gen_range(0..42);
            for _ in 0..moves {
                if game.status() == GameStatus::Finished {
                    break;
                }
                let valid: Vec<usize> = game.board().valid_moves().collect();
                game.apply_move(valid[rng.gen_range(0..valid.len())])?;
            }

            let snapshot = game.snapshot();
            let from_json = Snapshot::from_json(&snapshot.to_json()?)?;
            let from_bytes = Snapshot::from_bytes(&snapshot.to_bytes()?)?;
            for decoded in [from_json, from_bytes].iter() {
                assert_eq!(decoded.board, snapshot.board);
                assert_eq!(decoded.status, snapshot.status);
                assert_eq!(decoded.winner, snapshot.winner);
                assert_eq!(decoded, &snapshot);
            }
        }
        Ok(())
    }

    #[test]
    pub fn ai_vs_ai_game_runs_to_completion() -> Result<()> {
        let mut game = Game::new("selfplay");
        let config = SearchConfig::advanced()
            .with_max_depth(2)
            .with_time_budget(Duration::from_secs(5));
        game.set_mode_with_config(GameMode::AiVsAi, config)?;

        let mut moves = 0;
        while game.status() == GameStatus::Playing {
            let snapshot = game
                .play_ai_move()?
                .ok_or_else(|| anyhow!("AI found no move in a live game"))?;
            assert!(snapshot.last_metrics.is_some());
            moves += 1;
            assert!(moves <= WIDTH * HEIGHT);
        }
        assert_ne!(game.winner(), Winner::None);
        Ok(())
    }
}
