//! In-memory collection of live games
//!
//! Every game sits behind its own mutex, so requests against one game are
//! applied one at a time while different games proceed independently.

use tracing::info;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::{
    error::RegistryError,
    game::{Game, GameMode, GameStatus},
    snapshot::Snapshot,
};

/// How long a game counts as active after its last state change
pub const ACTIVE_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

/// Default number of games returned by [`GameRegistry::active_games`]
pub const DEFAULT_ACTIVE_LIMIT: usize = 10;

type Observer = Box<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
pub struct GameRegistry {
    games: RwLock<HashMap<String, Arc<Mutex<Game>>>>,
    observer: Option<Observer>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback invoked with the new snapshot after every state change
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    fn publish(&self, snapshot: &Snapshot) {
        if let Some(observer) = &self.observer {
            observer(snapshot);
        }
    }

    fn game(&self, id: &str) -> Result<Arc<Mutex<Game>>, RegistryError> {
        self.games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownGame(id.to_string()))
    }

    /// Runs `f` with exclusive access to the game, then publishes the returned
    /// snapshot once the game's lock is released, so observers may call back
    /// into the registry
    fn update<F>(&self, id: &str, f: F) -> Result<Snapshot, RegistryError>
    where
        F: FnOnce(&mut Game) -> Result<Snapshot, RegistryError>,
    {
        let game = self.game(id)?;
        let snapshot = {
            let mut game = game.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut game)?
        };
        self.publish(&snapshot);
        Ok(snapshot)
    }

    pub fn create(&self, id: impl Into<String>) -> Result<Snapshot, RegistryError> {
        let id = id.into();
        let snapshot = {
            let mut games = self.games.write().unwrap_or_else(PoisonError::into_inner);
            if games.contains_key(&id) {
                return Err(RegistryError::DuplicateGame(id));
            }
            let game = Game::new(id.clone());
            let snapshot = game.snapshot();
            games.insert(id.clone(), Arc::new(Mutex::new(game)));
            snapshot
        };
        info!(game = %id, "game created");
        self.publish(&snapshot);
        Ok(snapshot)
    }

    pub fn snapshot(&self, id: &str) -> Result<Snapshot, RegistryError> {
        let game = self.game(id)?;
        let game = game.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(game.snapshot())
    }

    pub fn set_mode(&self, id: &str, mode: GameMode) -> Result<Snapshot, RegistryError> {
        self.update(id, |game| {
            game.set_mode(mode)?;
            Ok(game.snapshot())
        })
    }

    pub fn apply_move(&self, id: &str, col: usize) -> Result<Snapshot, RegistryError> {
        self.update(id, |game| Ok(game.apply_move(col)?))
    }

    /// Plays the AI's move if the AI controls the player to move
    pub fn ai_move(&self, id: &str) -> Result<Snapshot, RegistryError> {
        self.update(id, |game| {
            let ai_turn = game.status() == GameStatus::Playing
                && game
                    .mode()
                    .map_or(false, |mode| mode.ai_controls(game.current_player()));
            if !ai_turn {
                return Err(RegistryError::NotAiTurn(game.id().to_string()));
            }
            game.play_ai_move()?
                .ok_or_else(|| RegistryError::NotAiTurn(game.id().to_string()))
        })
    }

    pub fn all_games(&self) -> Vec<Snapshot> {
        let games: Vec<Arc<Mutex<Game>>> = self
            .games
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        games
            .iter()
            .map(|game| game.lock().unwrap_or_else(PoisonError::into_inner).snapshot())
            .collect()
    }

    /// Games changed within the last day, most recent first
    pub fn active_games(&self, limit: usize, now_ms: u64) -> Vec<Snapshot> {
        let cutoff = now_ms.saturating_sub(ACTIVE_WINDOW_MS);
        let mut active: Vec<Snapshot> = self
            .all_games()
            .into_iter()
            .filter(|snapshot| snapshot.last_activity_at > cutoff)
            .collect();
        active.sort_by(|a, b| b.last_activity_at.cmp(&a.last_activity_at));
        active.truncate(limit);
        active
    }
}
