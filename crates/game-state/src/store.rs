//! The persisted game-state store.
//!
//! One record per game under a single storage key. Every mutation rewrites
//! the whole record through the backend before returning; there is no
//! buffering and no field-level persistence. Two processes sharing a backend
//! are not coordinated: the last write wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::backend::DurableBackend;
use crate::error::StoreError;
use crate::game::Game;
use crate::lifecycle::{SessionPhase, Transition};

/// Storage key holding the whole game-state record.
pub const STORAGE_KEY: &str = "gameState";

/// Progress flags for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub over: bool,
    #[serde(default)]
    pub winstreak: u32,
}

pub struct GameStateStore<B: DurableBackend> {
    backend: B,
    records: BTreeMap<Game, GameRecord>,
    loaded: bool,
}

fn default_records() -> BTreeMap<Game, GameRecord> {
    Game::ALL
        .into_iter()
        .map(|game| (game, GameRecord::default()))
        .collect()
}

impl<B: DurableBackend> GameStateStore<B> {
    /// Create a store over `backend` without reading it yet.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            records: default_records(),
            loaded: false,
        }
    }

    /// Create a store and load it from `backend`.
    pub fn open(backend: B) -> Result<Self, StoreError> {
        let mut store = Self::new(backend);
        store.load()?;
        Ok(store)
    }

    /// Read the durable record. Absent or malformed data yields defaults for
    /// every known game; games missing from a partial record get defaults.
    /// Calling this again after a successful load keeps in-memory progress.
    pub fn load(&mut self) -> Result<(), StoreError> {
        if self.loaded {
            return Ok(());
        }

        let mut records = default_records();
        if let Some(raw) = self.backend.read(STORAGE_KEY)? {
            match serde_json::from_str::<BTreeMap<String, GameRecord>>(&raw) {
                Ok(saved) => {
                    for (id, record) in saved {
                        match Game::recognize(&id) {
                            Some(game) => {
                                records.insert(game, record);
                            }
                            None => tracing::debug!(game = %id, "Ignoring unknown game in saved state"),
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Saved game state is malformed, using defaults");
                }
            }
        }

        self.records = records;
        self.loaded = true;
        Ok(())
    }

    pub fn set_active(&mut self, game: impl AsRef<str>, active: bool) -> Result<(), StoreError> {
        self.mutate(game.as_ref(), |record| record.active = active)
    }

    pub fn set_over(&mut self, game: impl AsRef<str>, over: bool) -> Result<(), StoreError> {
        self.mutate(game.as_ref(), |record| record.over = over)
    }

    /// Add one to the win streak unless the round is already over, so a
    /// duplicated win event cannot count twice.
    pub fn increment_winstreak(&mut self, game: impl AsRef<str>) -> Result<(), StoreError> {
        self.mutate(game.as_ref(), |record| {
            if !record.over {
                record.winstreak = record.winstreak.saturating_add(1);
            }
        })
    }

    pub fn reset_winstreak(&mut self, game: impl AsRef<str>) -> Result<(), StoreError> {
        self.mutate(game.as_ref(), |record| record.winstreak = 0)
    }

    pub fn is_active(&self, game: impl AsRef<str>) -> bool {
        self.record(game.as_ref()).map(|r| r.active).unwrap_or(false)
    }

    pub fn is_over(&self, game: impl AsRef<str>) -> bool {
        self.record(game.as_ref()).map(|r| r.over).unwrap_or(false)
    }

    pub fn get_winstreak(&self, game: impl AsRef<str>) -> u32 {
        self.record(game.as_ref()).map(|r| r.winstreak).unwrap_or(0)
    }

    pub fn phase(&self, game: Game) -> SessionPhase {
        let record = self.records.get(&game).copied().unwrap_or_default();
        SessionPhase::from_flags(record.active, record.over)
    }

    /// Apply a lifecycle transition, updating the flags and win streak.
    ///
    /// `Win` counts the win before marking the round over; `Lose` clears the
    /// streak. Transitions the current phase does not allow are rejected and
    /// leave the record untouched.
    pub fn apply(&mut self, game: Game, transition: Transition) -> Result<SessionPhase, StoreError> {
        self.load()?;
        let phase = self.phase(game);
        let next = phase
            .next(transition)
            .ok_or(StoreError::InvalidTransition {
                game,
                phase,
                transition,
            })?;

        let record = self.records.entry(game).or_default();
        match transition {
            Transition::Start => {
                record.active = true;
                record.over = false;
            }
            Transition::Win => {
                if !record.over {
                    record.winstreak = record.winstreak.saturating_add(1);
                }
                record.over = true;
            }
            Transition::Lose => {
                record.winstreak = 0;
                record.over = true;
            }
            Transition::Reset => {
                record.active = false;
                record.over = false;
            }
        }
        self.flush()?;

        tracing::debug!(game = %game, ?transition, ?next, "Game state transition");
        Ok(next)
    }

    /// Copy of every game's record.
    pub fn snapshot(&self) -> BTreeMap<Game, GameRecord> {
        self.records.clone()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn record(&self, id: &str) -> Option<&GameRecord> {
        Game::recognize(id).and_then(|game| self.records.get(&game))
    }

    fn mutate(&mut self, id: &str, f: impl FnOnce(&mut GameRecord)) -> Result<(), StoreError> {
        let Some(game) = Game::recognize(id) else {
            tracing::debug!(game = %id, "Ignoring state update for unknown game");
            return Ok(());
        };
        self.load()?;
        f(self.records.entry(game).or_default());
        self.flush()
    }

    fn flush(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.records)?;
        self.backend.write(STORAGE_KEY, &json)
    }
}
