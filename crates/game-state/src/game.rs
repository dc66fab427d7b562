use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Games served by the Lexis interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    Snuzzle,
    Filmster,
    Raildle,
}

impl Game {
    pub const ALL: [Game; 3] = [Game::Snuzzle, Game::Filmster, Game::Raildle];

    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Snuzzle => "snuzzle",
            Game::Filmster => "filmster",
            Game::Raildle => "raildle",
        }
    }

    /// Look up a game by identifier, returning `None` for anything unknown.
    pub fn recognize(id: &str) -> Option<Game> {
        Game::ALL.into_iter().find(|g| g.as_str() == id)
    }
}

impl std::fmt::Display for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Game {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game '{0}' (expected one of: snuzzle, filmster, raildle)")]
pub struct UnknownGame(pub String);

impl std::str::FromStr for Game {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Game::recognize(s.trim()).ok_or_else(|| UnknownGame(s.to_string()))
    }
}
