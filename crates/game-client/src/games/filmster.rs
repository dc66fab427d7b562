//! Filmster: pick the movie from four choices, one hint at a time.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::{command_arg, verb, RoundStatus};
use crate::error::GameClientError;
use crate::traits::GameHandler;
use crate::types::CommandResult;

pub const HINT_COUNT: usize = 3;
pub const CHOICE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movie {
    pub key: String,
    pub title: String,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub key: String,
    pub title: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceOutcome {
    Correct,
    Wrong { tries_left: u32 },
    Lost,
}

/// `TheLionKing` → `The Lion King`.
pub fn display_title(key: &str) -> String {
    let mut title = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            title.push(' ');
        }
        title.push(c);
    }
    title.trim().to_string()
}

/// Command sent to the interpreter for a wrong choice.
pub fn guess_command(key: &str) -> String {
    format!("guess {}", key)
}

#[derive(Debug, Clone, Serialize)]
pub struct FilmsterRound {
    max_guesses: u32,
    movies: BTreeMap<String, Movie>,
    pinned: Option<String>,
    secret: Option<String>,
    choices: Vec<Choice>,
    hints_revealed: usize,
    tries_left: u32,
    wrong: Vec<String>,
    status: RoundStatus,
    message: String,
}

impl FilmsterRound {
    pub fn new(max_guesses: u32) -> Self {
        Self {
            max_guesses,
            movies: BTreeMap::new(),
            pinned: None,
            secret: None,
            choices: Vec::new(),
            hints_revealed: 0,
            tries_left: max_guesses,
            wrong: Vec::new(),
            status: RoundStatus::Waiting,
            message: String::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_guesses);
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tries_left(&self) -> u32 {
        self.tries_left
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    pub fn secret(&self) -> Option<&Movie> {
        self.secret.as_ref().and_then(|key| self.movies.get(key))
    }

    /// Hints unlocked so far, first one included once the round is dealt.
    pub fn hints(&self) -> &[String] {
        match self.secret() {
            Some(movie) => &movie.hints[..self.hints_revealed.min(movie.hints.len())],
            None => &[],
        }
    }

    /// Pin the secret from a `word <key>` command.
    pub fn pin(&mut self, key: Option<&str>) {
        self.pinned = key.map(str::to_string);
    }

    /// Read the `words` result: movie key → list of hints.
    pub fn load_bank(&mut self, result: &CommandResult) -> Result<(), GameClientError> {
        let entries = result.raw().as_object().ok_or_else(|| {
            GameClientError::Decode(format!("unexpected word bank format: {}", result.raw()))
        })?;

        self.movies = entries
            .iter()
            .map(|(key, value)| {
                let hints: Vec<String> = value
                    .as_array()
                    .map(|items| {
                        items
                            .iter()
                            .map(|h| h.as_str().map(str::to_string).unwrap_or_else(|| h.to_string()))
                            .collect()
                    })
                    .unwrap_or_default();
                let hints = if hints.len() >= HINT_COUNT {
                    hints
                } else {
                    tracing::warn!(movie = %key, "Movie has fewer than {} hints", HINT_COUNT);
                    (1..=HINT_COUNT).map(|n| format!("Hint {}", n)).collect()
                };

                let movie = Movie {
                    key: key.clone(),
                    title: display_title(key),
                    hints,
                };
                (key.clone(), movie)
            })
            .collect();
        Ok(())
    }

    /// Pick the secret and lay out the choices.
    ///
    /// The secret is the `show` result's `name`, else the pinned key, else
    /// a random movie; a name that is not in the bank is ignored.
    pub fn deal<R: Rng + ?Sized>(
        &mut self,
        show: &CommandResult,
        rng: &mut R,
    ) -> Result<(), GameClientError> {
        let keys: Vec<&String> = self.movies.keys().collect();
        let secret = [show.field_str("name"), self.pinned.as_deref()]
            .into_iter()
            .flatten()
            .find(|key| self.movies.contains_key(*key))
            .map(str::to_string)
            .or_else(|| keys.choose(rng).map(|k| k.to_string()));

        if keys.len() < CHOICE_COUNT {
            return Err(GameClientError::Logic(
                "Not enough movies in word bank. Need at least 4.".to_string(),
            ));
        }
        let Some(secret) = secret else {
            return Err(GameClientError::Logic(
                "Error: Invalid movie selection.".to_string(),
            ));
        };

        let mut others: Vec<&String> = keys.into_iter().filter(|k| **k != secret).collect();
        others.shuffle(rng);
        let mut picks: Vec<String> = others
            .into_iter()
            .take(CHOICE_COUNT - 1)
            .cloned()
            .collect();
        picks.push(secret.clone());
        picks.shuffle(rng);

        self.choices = picks
            .into_iter()
            .map(|key| Choice {
                title: display_title(&key),
                disabled: self.wrong.contains(&key),
                key,
            })
            .collect();
        self.secret = Some(secret);
        self.hints_revealed = 1;
        self.tries_left = self.max_guesses;
        self.status = RoundStatus::Playing;
        self.message = String::new();
        Ok(())
    }

    /// The player picks a choice, by key or by its displayed title.
    pub fn choose(&mut self, pick: &str) -> Result<ChoiceOutcome, GameClientError> {
        if self.status != RoundStatus::Playing {
            return Err(GameClientError::Logic("The round is not in play.".to_string()));
        }

        let key = self
            .find_choice(pick)
            .filter(|c| !c.disabled)
            .map(|c| c.key.clone())
            .ok_or_else(|| {
                GameClientError::Logic(format!("'{}' is not an open choice.", pick.trim()))
            })?;

        if self.secret.as_deref() == Some(key.as_str()) {
            self.status = RoundStatus::Won;
            for choice in &mut self.choices {
                choice.disabled = true;
            }
            self.message = "Correct! You guessed it!".to_string();
            return Ok(ChoiceOutcome::Correct);
        }

        Ok(self.miss(&key))
    }

    /// Choice matching a key or, ignoring case, a displayed title.
    pub fn find_choice(&self, pick: &str) -> Option<&Choice> {
        let pick = pick.trim();
        self.choices
            .iter()
            .find(|c| c.key == pick || c.title.eq_ignore_ascii_case(pick))
    }

    /// A `guess <key>` seen in a replayed session.
    pub fn record_guess(&mut self, key: &str) {
        if self.status != RoundStatus::Playing
            || self.wrong.iter().any(|k| k == key)
            || self.secret.as_deref() == Some(key)
            || !self.movies.contains_key(key)
        {
            return;
        }
        self.miss(key);
    }

    fn miss(&mut self, key: &str) -> ChoiceOutcome {
        self.wrong.push(key.to_string());
        if let Some(choice) = self.choices.iter_mut().find(|c| c.key == key) {
            choice.disabled = true;
        }
        self.tries_left = self.tries_left.saturating_sub(1);

        if self.tries_left > 0 {
            let available = self.secret().map_or(0, |m| m.hints.len());
            if self.hints_revealed < HINT_COUNT && self.hints_revealed < available {
                self.hints_revealed += 1;
            }
            self.message = format!(
                "Wrong! Try again. {} {} left.",
                self.tries_left,
                if self.tries_left == 1 { "try" } else { "tries" }
            );
            ChoiceOutcome::Wrong {
                tries_left: self.tries_left,
            }
        } else {
            let title = self
                .secret()
                .map(|m| m.title.clone())
                .unwrap_or_default();
            for choice in &mut self.choices {
                choice.disabled = true;
            }
            self.status = RoundStatus::Lost;
            self.message = format!("Game Over! The answer was {}.", title);
            ChoiceOutcome::Lost
        }
    }
}

impl fmt::Display for FilmsterRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, hint) in self.hints().iter().enumerate() {
            writeln!(f, "Hint {}: {}", i + 1, hint)?;
        }
        for i in self.hints().len()..HINT_COUNT {
            writeln!(f, "Hint {}: Locked", i + 1)?;
        }
        for (i, choice) in self.choices.iter().enumerate() {
            let mark = if choice.disabled { "x" } else { " " };
            writeln!(f, "[{}] {}. {}", mark, i + 1, choice.title)?;
        }
        write!(f, "Tries left: {}", self.tries_left)
    }
}

/// Round reducer registered for [`Game::Filmster`](lexis_game_state::Game::Filmster).
pub struct FilmsterHandler {
    round: Mutex<FilmsterRound>,
    rng: Mutex<StdRng>,
}

impl FilmsterHandler {
    pub fn new(max_guesses: u32) -> Self {
        Self::with_rng(max_guesses, StdRng::from_entropy())
    }

    /// Deterministic choices, for tests and replays.
    pub fn with_seed(max_guesses: u32, seed: u64) -> Self {
        Self::with_rng(max_guesses, StdRng::seed_from_u64(seed))
    }

    fn with_rng(max_guesses: u32, rng: StdRng) -> Self {
        Self {
            round: Mutex::new(FilmsterRound::new(max_guesses)),
            rng: Mutex::new(rng),
        }
    }

    pub fn round(&self) -> FilmsterRound {
        self.round.lock().clone()
    }

    /// Apply the player's pick. Returns the chosen movie key, which a wrong
    /// pick must be reported under with [`guess_command`].
    pub fn choose(&self, pick: &str) -> Result<(String, ChoiceOutcome), GameClientError> {
        let mut round = self.round.lock();
        let key = round
            .find_choice(pick)
            .map(|c| c.key.clone())
            .unwrap_or_else(|| pick.trim().to_string());
        let outcome = round.choose(pick)?;
        Ok((key, outcome))
    }
}

impl GameHandler for FilmsterHandler {
    fn handle(&self, command: &str, result: &CommandResult) {
        let mut round = self.round.lock();
        match verb(command) {
            "start" => round.reset(),
            "word" => round.pin(command_arg(command, "word")),
            "words" => {
                if let Err(e) = round.load_bank(result) {
                    tracing::warn!(error = %e, "Could not read filmster word bank");
                    round.message = "Error loading game. Please retry.".to_string();
                }
            }
            "show" => {
                let mut rng = self.rng.lock();
                if let Err(e) = round.deal(result, &mut *rng) {
                    tracing::warn!(error = %e, "Could not deal filmster round");
                    round.message = e.to_string();
                }
            }
            "guess" => {
                if let Some(key) = command_arg(command, "guess") {
                    round.record_guess(key);
                }
            }
            _ => {}
        }
    }

    fn round_status(&self) -> Option<RoundStatus> {
        Some(self.round.lock().status())
    }
}
