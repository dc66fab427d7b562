//! Session setup and resume policy.

use lexis_game_state::Game;

use crate::types::BatchResult;

/// Setup sequence for a fresh round.
///
/// `secret` pins the secret word (`word <secret>`); `None` lets the
/// interpreter pick one. Filmster and raildle also fetch the word bank
/// because their UI needs it before the first guess.
pub fn setup_commands(game: Game, max_guesses: u32, secret: Option<&str>) -> Vec<String> {
    let word = match secret.map(str::trim).filter(|s| !s.is_empty()) {
        Some(secret) => format!("word {}", secret),
        None => "word".to_string(),
    };

    let mut commands = vec![
        format!("file {}", game),
        "start".to_string(),
        format!("max_guesses {}", max_guesses),
        word,
    ];

    match game {
        Game::Snuzzle => commands.push("show".to_string()),
        Game::Filmster => {
            commands.push("words".to_string());
            commands.push("show".to_string());
        }
        Game::Raildle => {
            commands.push("show".to_string());
            commands.push("words".to_string());
        }
    }

    commands
}

/// What to send after looking at the server-side session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPlan {
    /// A round is in progress: replay its commands to rebuild state.
    Resume(Vec<String>),
    /// Nothing worth keeping: run the setup sequence.
    Fresh(Vec<String>),
}

impl SessionPlan {
    pub fn commands(&self) -> &[String] {
        match self {
            SessionPlan::Resume(commands) | SessionPlan::Fresh(commands) => commands,
        }
    }

    pub fn is_resume(&self) -> bool {
        matches!(self, SessionPlan::Resume(_))
    }
}

/// A session holding more commands than the setup sequence has seen at
/// least one guess, so it is replayed; anything shorter starts over.
pub fn plan_session(previous: Vec<String>, setup: &[String]) -> SessionPlan {
    if previous.len() > setup.len() {
        SessionPlan::Resume(previous)
    } else {
        SessionPlan::Fresh(setup.to_vec())
    }
}

/// Result of [`CommandClient::resume_or_start`](crate::client::CommandClient::resume_or_start).
#[derive(Debug, Clone)]
pub struct SessionStart {
    pub resumed: bool,
    pub batch: BatchResult,
}
