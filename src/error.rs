use crate::game::{GameMode, GameStatus};

/// A move that was rejected. The game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidMove {
    #[error("invalid move: game is {0}, not playing")]
    NotPlaying(GameStatus),

    #[error("invalid move: column {0} out of range, columns must be between 0 and 6")]
    ColumnOutOfRange(usize),

    #[error("invalid move: column {0} is full")]
    ColumnFull(usize),
}

/// A mode assignment that was rejected. The game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidModeTransition {
    #[error("invalid mode transition: mode already set to {0}")]
    AlreadySet(GameMode),

    #[error("invalid mode transition: game is finished")]
    Finished,
}

/// Errors raised by the game registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("game not found: {0}")]
    UnknownGame(String),

    #[error("game already exists: {0}")]
    DuplicateGame(String),

    #[error("game {0} is not waiting on an AI move")]
    NotAiTurn(String),

    #[error(transparent)]
    Move(#[from] InvalidMove),

    #[error(transparent)]
    Mode(#[from] InvalidModeTransition),
}

/// Errors decoding a transported snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("truncated snapshot frame: {0}")]
    Truncated(#[from] std::io::Error),

    #[error("invalid {field} tag {tag} in snapshot frame")]
    BadTag { field: &'static str, tag: u8 },

    #[error("game id is not valid UTF-8")]
    BadId(#[from] std::string::FromUtf8Error),

    #[error("game id of {0} bytes doesn't fit in a snapshot frame")]
    IdTooLong(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_move_display() {
        assert_eq!(
            InvalidMove::ColumnFull(3).to_string(),
            "invalid move: column 3 is full"
        );
        assert_eq!(
            InvalidMove::NotPlaying(GameStatus::Finished).to_string(),
            "invalid move: game is finished, not playing"
        );
    }

    #[test]
    fn registry_error_wraps_move_errors() {
        let err: RegistryError = InvalidMove::ColumnOutOfRange(9).into();
        assert_eq!(
            err.to_string(),
            "invalid move: column 9 out of range, columns must be between 0 and 6"
        );
    }

    #[test]
    fn mode_transition_display() {
        assert_eq!(
            InvalidModeTransition::AlreadySet(GameMode::AiVsAi).to_string(),
            "invalid mode transition: mode already set to ai"
        );
    }
}
