//! Per-game view state.
//!
//! Each game keeps a small state reducer fed by the command results the
//! client dispatches to it. The reducers know nothing about the transport;
//! front ends read their state and ask them to validate player input.

pub mod filmster;
pub mod raildle;
pub mod snuzzle;

use std::sync::Arc;

use lexis_game_state::Game;
use serde::Serialize;

use crate::client::CommandClient;
use crate::config::GameSettings;
use crate::types::{CommandResult, Outcome};

pub use filmster::{FilmsterHandler, FilmsterRound};
pub use raildle::{RaildleHandler, RaildleRound};
pub use snuzzle::{SnuzzleBoard, SnuzzleHandler};

/// Where a round stands from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Setup has not produced a playable round yet.
    Waiting,
    Playing,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn is_over(self) -> bool {
        matches!(self, RoundStatus::Won | RoundStatus::Lost)
    }

    pub fn outcome(self) -> Option<Outcome> {
        match self {
            RoundStatus::Won => Some(Outcome::Win),
            RoundStatus::Lost => Some(Outcome::Lose),
            _ => None,
        }
    }
}

/// Handlers for every game, registered on a client.
#[derive(Clone)]
pub struct GameHandlers {
    pub snuzzle: Arc<SnuzzleHandler>,
    pub filmster: Arc<FilmsterHandler>,
    pub raildle: Arc<RaildleHandler>,
}

impl GameHandlers {
    pub fn new(settings: &GameSettings) -> Self {
        Self {
            snuzzle: Arc::new(SnuzzleHandler::new(settings.max_guesses(Game::Snuzzle))),
            filmster: Arc::new(FilmsterHandler::new(settings.max_guesses(Game::Filmster))),
            raildle: Arc::new(RaildleHandler::new(settings.max_guesses(Game::Raildle))),
        }
    }

    /// Register all three handlers on `client`.
    pub fn register(&self, client: &mut CommandClient) {
        client.register_handler(Game::Snuzzle, self.snuzzle.clone());
        client.register_handler(Game::Filmster, self.filmster.clone());
        client.register_handler(Game::Raildle, self.raildle.clone());
    }

    /// Current status of `game`'s round.
    pub fn status(&self, game: Game) -> RoundStatus {
        match game {
            Game::Snuzzle => self.snuzzle.board().status(),
            Game::Filmster => self.filmster.round().status(),
            Game::Raildle => self.raildle.round().status(),
        }
    }
}

/// First word of a command line.
pub(crate) fn verb(command: &str) -> &str {
    command.split_whitespace().next().unwrap_or_default()
}

/// Argument of `<verb> <arg>`, if the command is that verb and has one.
pub(crate) fn command_arg<'a>(command: &'a str, expected: &str) -> Option<&'a str> {
    let (head, rest) = command.trim().split_once(char::is_whitespace)?;
    let rest = rest.trim();
    (head == expected && !rest.is_empty()).then_some(rest)
}

/// JSON object carried by a result, either directly or as JSON text.
pub(crate) fn json_object(result: &CommandResult) -> Option<serde_json::Value> {
    match result.raw() {
        value @ serde_json::Value::Object(_) => Some(value.clone()),
        serde_json::Value::String(text) => serde_json::from_str::<serde_json::Value>(text)
            .ok()
            .filter(|v| v.is_object()),
        _ => None,
    }
}
