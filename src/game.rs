//! A single game session: board, turn, phase and the AI's last decision

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    agent,
    board::{Board, Player},
    config::SearchConfig,
    error::{InvalidModeTransition, InvalidMove},
    metrics::SearchMetrics,
    snapshot::Snapshot,
    WIDTH,
};

/// Who is in control of the two seats
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Two humans
    #[serde(rename = "2p")]
    TwoPlayer,
    /// A human as player one against the AI as player two
    #[serde(rename = "1p")]
    SingleVsAi,
    /// The AI plays both seats
    #[serde(rename = "ai")]
    AiVsAi,
}

impl GameMode {
    /// Whether the AI plays `player`'s seat in this mode
    pub fn ai_controls(self, player: Player) -> bool {
        match self {
            GameMode::TwoPlayer => false,
            GameMode::SingleVsAi => player == Player::Two,
            GameMode::AiVsAi => true,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            GameMode::TwoPlayer => "2p",
            GameMode::SingleVsAi => "1p",
            GameMode::AiVsAi => "ai",
        };
        write!(f, "{}", tag)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Playing,
    Finished,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Playing => "playing",
            GameStatus::Finished => "finished",
        };
        write!(f, "{}", tag)
    }
}

/// Result of a game, serialized as `null`, `1`, `2` or `"draw"`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Winner {
    None,
    One,
    Two,
    Draw,
}

impl From<Player> for Winner {
    fn from(player: Player) -> Self {
        match player {
            Player::One => Winner::One,
            Player::Two => Winner::Two,
        }
    }
}

impl Serialize for Winner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Winner::None => serializer.serialize_none(),
            Winner::One => serializer.serialize_u8(1),
            Winner::Two => serializer.serialize_u8(2),
            Winner::Draw => serializer.serialize_str("draw"),
        }
    }
}

impl<'de> Deserialize<'de> for Winner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Player(u8),
            Tag(String),
        }

        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(Winner::None),
            Some(Repr::Player(1)) => Ok(Winner::One),
            Some(Repr::Player(2)) => Ok(Winner::Two),
            Some(Repr::Tag(tag)) if tag == "draw" => Ok(Winner::Draw),
            Some(_) => Err(serde::de::Error::custom("winner must be null, 1, 2 or \"draw\"")),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LastMove {
    pub row: usize,
    pub col: usize,
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// A game session
///
/// # Lifecycle
/// A game starts out `Waiting`. Assigning a mode moves it to `Playing`, and
/// the move that wins or fills the board moves it to `Finished`, after which
/// it never changes again.
#[derive(Clone, Debug)]
pub struct Game {
    id: String,
    board: Board,
    current_player: Player,
    mode: Option<GameMode>,
    config: SearchConfig,
    status: GameStatus,
    winner: Winner,
    last_move: Option<LastMove>,
    created_at: u64,
    last_activity_at: u64,
    last_metrics: Option<SearchMetrics>,
}

impl Game {
    pub fn new(id: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: id.into(),
            board: Board::new(),
            current_player: Player::One,
            mode: None,
            config: SearchConfig::default(),
            status: GameStatus::Waiting,
            winner: Winner::None,
            last_move: None,
            created_at: now,
            last_activity_at: now,
            last_metrics: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn winner(&self) -> Winner {
        self.winner
    }

    pub fn last_activity_at(&self) -> u64 {
        self.last_activity_at
    }

    pub fn last_metrics(&self) -> Option<&SearchMetrics> {
        self.last_metrics.as_ref()
    }

    /// Assigns the mode and starts the game, with the search settings of that mode
    pub fn set_mode(&mut self, mode: GameMode) -> Result<(), InvalidModeTransition> {
        self.set_mode_with_config(mode, SearchConfig::for_mode(mode))
    }

    /// Assigns the mode and starts the game with explicit search settings
    pub fn set_mode_with_config(
        &mut self,
        mode: GameMode,
        config: SearchConfig,
    ) -> Result<(), InvalidModeTransition> {
        if self.status == GameStatus::Finished {
            return Err(InvalidModeTransition::Finished);
        }
        if let Some(current) = self.mode {
            return Err(InvalidModeTransition::AlreadySet(current));
        }

        self.mode = Some(mode);
        self.config = config;
        self.status = GameStatus::Playing;
        self.last_activity_at = now_millis();
        info!(game = %self.id, %mode, "game mode set");
        Ok(())
    }

    /// Drops the current player's piece into `col`
    pub fn apply_move(&mut self, col: usize) -> Result<Snapshot, InvalidMove> {
        if self.status != GameStatus::Playing {
            return Err(InvalidMove::NotPlaying(self.status));
        }
        if col >= WIDTH {
            return Err(InvalidMove::ColumnOutOfRange(col));
        }
        let row = self
            .board
            .drop_piece(col, self.current_player)
            .ok_or(InvalidMove::ColumnFull(col))?;

        self.last_move = Some(LastMove { row, col });
        self.last_activity_at = now_millis();
        debug!(game = %self.id, player = %self.current_player, row, col, "move applied");

        if self.board.is_winning_placement(row, col) {
            self.status = GameStatus::Finished;
            self.winner = self.current_player.into();
            info!(game = %self.id, winner = %self.current_player, "game won");
        } else if self.board.is_full() {
            self.status = GameStatus::Finished;
            self.winner = Winner::Draw;
            info!(game = %self.id, "game drawn");
        } else {
            self.current_player = self.current_player.other();
        }

        Ok(self.snapshot())
    }

    /// Picks a column for `for_player` (the player to move by default) and
    /// records the decision's metrics. Returns `None` when no move can be made.
    pub fn select_ai_move(&mut self, for_player: Option<Player>) -> Option<usize> {
        if self.status != GameStatus::Playing {
            return None;
        }
        let player = for_player.unwrap_or(self.current_player);
        let decision = agent::select_move(&self.board, player, &self.config)?;
        self.last_metrics = Some(decision.metrics);
        Some(decision.column)
    }

    /// Selects and applies a move for the player to move
    pub fn play_ai_move(&mut self) -> Result<Option<Snapshot>, InvalidMove> {
        match self.select_ai_move(None) {
            Some(column) => self.apply_move(column).map(Some),
            None => Ok(None),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            id: self.id.clone(),
            board: self.board,
            current_player: self.current_player,
            mode: self.mode,
            status: self.status,
            winner: self.winner,
            last_move: self.last_move,
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
            last_metrics: self.last_metrics.clone(),
        }
    }
}
