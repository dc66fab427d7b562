use thiserror::Error;

use crate::game::Game;
use crate::lifecycle::{SessionPhase, Transition};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(String),

    #[error("storage serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid transition {transition:?} for {game} in phase {phase:?}")]
    InvalidTransition {
        game: Game,
        phase: SessionPhase,
        transition: Transition,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(error: std::io::Error) -> Self {
        StoreError::Io(error.to_string())
    }
}
