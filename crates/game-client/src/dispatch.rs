//! Per-game result routing.
//!
//! A lookup table from [`Game`] to its registered [`GameHandler`]. Adding a
//! game means registering a handler, not adding a branch.

use std::collections::HashMap;
use std::sync::Arc;

use lexis_game_state::Game;

use crate::games::RoundStatus;
use crate::traits::GameHandler;
use crate::types::CommandResult;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Game, Arc<dyn GameHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `game`, returning the handler it replaces.
    pub fn register(
        &mut self,
        game: Game,
        handler: Arc<dyn GameHandler>,
    ) -> Option<Arc<dyn GameHandler>> {
        self.handlers.insert(game, handler)
    }

    pub fn unregister(&mut self, game: Game) -> Option<Arc<dyn GameHandler>> {
        self.handlers.remove(&game)
    }

    pub fn get(&self, game: Game) -> Option<&Arc<dyn GameHandler>> {
        self.handlers.get(&game)
    }

    /// Route one result. Returns `false` when no handler is registered.
    pub fn dispatch(&self, game: Game, command: &str, result: &CommandResult) -> bool {
        match self.handlers.get(&game) {
            Some(handler) => {
                handler.handle(command, result);
                true
            }
            None => {
                tracing::debug!(game = %game, command = %command, "No handler registered");
                false
            }
        }
    }

    /// Round status reported by `game`'s handler.
    pub fn round_status(&self, game: Game) -> Option<RoundStatus> {
        self.handlers.get(&game).and_then(|h| h.round_status())
    }

    pub fn registered(&self) -> Vec<Game> {
        let mut games: Vec<Game> = self.handlers.keys().copied().collect();
        games.sort();
        games
    }
}
