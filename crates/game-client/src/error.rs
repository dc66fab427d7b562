use lexis_game_state::{StoreError, UnknownGame};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameClientError {
    /// The request failed or the interpreter answered with a non-success status.
    #[error("transport error: {reason}")]
    Transport { reason: String, status: Option<u16> },

    /// The interpreter answered, but not in the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Not enough data to play (shown to the user as-is).
    #[error("{0}")]
    Logic(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("game state error: {0}")]
    Store(StoreError),

    /// A lifecycle transition the current phase does not allow.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error(transparent)]
    UnknownGame(#[from] UnknownGame),
}

impl From<StoreError> for GameClientError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::InvalidTransition { .. } => GameClientError::Lifecycle(error.to_string()),
            other => GameClientError::Store(other),
        }
    }
}

impl GameClientError {
    pub fn transport(reason: impl Into<String>) -> Self {
        GameClientError::Transport {
            reason: reason.into(),
            status: None,
        }
    }

    /// HTTP status of a rejected request, if the interpreter answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GameClientError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GameClientError::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_and_status() {
        let err = GameClientError::Transport {
            reason: "HTTP 502 from /run/snuzzle".to_string(),
            status: Some(502),
        };
        assert_eq!(err.to_string(), "transport error: HTTP 502 from /run/snuzzle");
        assert_eq!(err.status(), Some(502));
        assert!(err.is_transport());
    }

    #[test]
    fn invalid_transition_maps_to_lifecycle() {
        use lexis_game_state::{Game, SessionPhase, Transition};

        let err: GameClientError = StoreError::InvalidTransition {
            game: Game::Snuzzle,
            phase: SessionPhase::Over,
            transition: Transition::Win,
        }
        .into();
        assert!(matches!(err, GameClientError::Lifecycle(_)));

        let io: GameClientError = StoreError::Io("disk full".into()).into();
        assert!(matches!(io, GameClientError::Store(_)));
    }

    #[test]
    fn logic_error_is_plain_text() {
        let err = GameClientError::Logic("Not enough movies in word bank. Need at least 4.".into());
        assert_eq!(err.to_string(), "Not enough movies in word bank. Need at least 4.");
        assert_eq!(err.status(), None);
    }
}
