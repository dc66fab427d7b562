use async_trait::async_trait;
use lexis_game_state::Game;

use crate::error::GameClientError;
use crate::games::RoundStatus;
use crate::types::{BatchResponse, CommandResult, SessionRecord};

/// Wire access to the interpreter service.
///
/// [`HttpInterpreter`](crate::transport::HttpInterpreter) is the production
/// implementation; tests plug in scripted doubles.
#[async_trait]
pub trait InterpreterTransport: Send + Sync {
    /// Execute one command and return the raw result.
    async fn run(&self, game: Game, command: &str) -> Result<CommandResult, GameClientError>;

    /// Execute commands in order in a single round trip.
    async fn run_batch(
        &self,
        game: Game,
        commands: &[String],
    ) -> Result<BatchResponse, GameClientError>;

    /// Commands issued so far in the current server-side session.
    async fn fetch_session(&self, game: Game) -> Result<SessionRecord, GameClientError>;

    /// Discard the server-side session.
    async fn reset_game(&self, game: Game) -> Result<(), GameClientError>;
}

/// Receives every command result for the game it is registered under.
///
/// Handlers keep their own view state behind interior mutability; the
/// client only routes results to them.
pub trait GameHandler: Send + Sync {
    fn handle(&self, command: &str, result: &CommandResult);

    /// Status of the round this handler has built, if it tracks one.
    fn round_status(&self) -> Option<RoundStatus> {
        None
    }
}

