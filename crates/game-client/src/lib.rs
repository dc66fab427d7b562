//! Command client for the Lexis game interpreter.
//!
//! Sends single commands and ordered batches to the interpreter service,
//! replays in-progress sessions, and routes every result to the handler
//! registered for its game. Win/lose bookkeeping goes through the persisted
//! store in `lexis-game-state`.
//!
//! # Components
//! - `CommandClient`: send, batch, session fetch/replay, reset
//! - `HttpInterpreter`: reqwest transport behind `InterpreterTransport`
//! - `HandlerRegistry`: per-game dispatch table
//! - `games`: snuzzle, filmster and raildle view-state reducers
//! - `SecretResolver`: recovers the secret word after a lost round

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod secret;
pub mod session;
pub mod traits;
pub mod transport;
pub mod types;

pub mod games;

// Re-export core types
pub use client::{CommandClient, DynStore, SharedStore};
pub use config::{
    ArcadeConfig, ConfigError, GameSettings, InterpreterConfig, LoggingConfig, StateConfig,
};
pub use dispatch::HandlerRegistry;
pub use error::GameClientError;
pub use logging::{CommandAction, CommandLog, CommandLogger};
pub use secret::{
    reveal, ScrapingSecretResolver, SecretEvidence, SecretResolver, StructuredSecretResolver,
    UNKNOWN_SECRET,
};
pub use session::{plan_session, setup_commands, SessionPlan, SessionStart};
pub use traits::{GameHandler, InterpreterTransport};
pub use transport::HttpInterpreter;
pub use types::{
    BatchEntry, BatchResponse, BatchResult, CommandResult, Feedback, FeedbackCell, GuessReport,
    Outcome, SessionRecord,
};

pub use games::{GameHandlers, RoundStatus};

pub use lexis_game_state::{
    DurableBackend, FileBackend, Game, GameRecord, GameStateStore, MemoryBackend, SessionPhase,
    StoreError, Transition, UnknownGame,
};
