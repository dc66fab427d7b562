//! Explicit session lifecycle: not started → active → over → (reset | start).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NotStarted,
    Active,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Start,
    Win,
    Lose,
    Reset,
}

impl SessionPhase {
    /// Derive the phase from the persisted flags. `over` wins over `active`
    /// because a finished round stays finished until reset or restarted.
    pub fn from_flags(active: bool, over: bool) -> Self {
        match (active, over) {
            (_, true) => SessionPhase::Over,
            (true, false) => SessionPhase::Active,
            (false, false) => SessionPhase::NotStarted,
        }
    }

    /// The phase reached by applying `transition`, or `None` if the
    /// transition is not allowed from this phase.
    pub fn next(self, transition: Transition) -> Option<SessionPhase> {
        use SessionPhase::*;
        use Transition::*;

        match (self, transition) {
            (NotStarted | Over, Start) => Some(Active),
            (Active, Win | Lose) => Some(Over),
            (_, Reset) => Some(NotStarted),
            _ => None,
        }
    }

    pub fn is_playable(self) -> bool {
        self == SessionPhase::Active
    }
}
