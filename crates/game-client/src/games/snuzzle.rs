//! Snuzzle: five-letter word guessing with tile feedback.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;
use regex::Regex;
use serde::Serialize;

use super::{command_arg, json_object, verb, RoundStatus};
use crate::error::GameClientError;
use crate::traits::GameHandler;
use crate::types::CommandResult;

pub const WORD_LENGTH: usize = 5;

/// Colour of one tile or keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Correct,
    Misplaced,
    Wrong,
}

impl Tile {
    pub fn from_square(square: char) -> Self {
        match square {
            '🟩' => Tile::Correct,
            '🟨' => Tile::Misplaced,
            _ => Tile::Wrong,
        }
    }

    pub fn square(self) -> char {
        match self {
            Tile::Correct => '🟩',
            Tile::Misplaced => '🟨',
            Tile::Wrong => '⬜',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    /// Letters guessed; unknown for guesses replayed by the interpreter.
    pub guess: Option<String>,
    pub tiles: Vec<Tile>,
}

/// What a guess result did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessStep {
    /// The interpreter rejected the word; the row stays free.
    NotInBank,
    Scored(RoundStatus),
}

/// A decoded guess answer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Decoded {
    NotInBank,
    Scored {
        feedback: String,
        result: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SnuzzleBoard {
    max_guesses: u32,
    rows: Vec<BoardRow>,
    keyboard: BTreeMap<char, Tile>,
    status: RoundStatus,
    message: String,
}

impl SnuzzleBoard {
    pub fn new(max_guesses: u32) -> Self {
        Self {
            max_guesses,
            rows: Vec::new(),
            keyboard: BTreeMap::new(),
            status: RoundStatus::Waiting,
            message: String::new(),
        }
    }

    /// Clear the board for a new round.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.keyboard.clear();
        self.status = RoundStatus::Playing;
        self.message = "Ready to play! Make your first guess.".to_string();
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    pub fn key(&self, letter: char) -> Option<Tile> {
        self.keyboard.get(&letter.to_ascii_lowercase()).copied()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn remaining(&self) -> u32 {
        self.max_guesses.saturating_sub(self.rows.len() as u32)
    }

    /// Check player input before it is sent. Returns the lowercased guess.
    pub fn validate_guess(&self, input: &str) -> Result<String, String> {
        if self.status.is_over() || self.remaining() == 0 {
            return Err("The game is over.".to_string());
        }

        let guess = input.trim();
        if !guess.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err("Letters only!".to_string());
        }
        match guess.len() {
            n if n < WORD_LENGTH => Err("Not enough letters!".to_string()),
            n if n > WORD_LENGTH => Err("Too many letters!".to_string()),
            _ => Ok(guess.to_ascii_lowercase()),
        }
    }

    /// Apply the interpreter's answer to `guess`.
    pub fn apply_guess(
        &mut self,
        guess: Option<&str>,
        result: &CommandResult,
    ) -> Result<GuessStep, GameClientError> {
        let (feedback, outcome) = match decode_guess(result)? {
            Decoded::NotInBank => {
                self.message = "Word not in word bank!".to_string();
                return Ok(GuessStep::NotInBank);
            }
            Decoded::Scored { feedback, result } => (feedback, result),
        };

        let tiles: Vec<Tile> = feedback.chars().map(Tile::from_square).collect();
        if tiles.len() != WORD_LENGTH {
            return Err(GameClientError::Decode(format!(
                "expected {} feedback tiles, got {}",
                WORD_LENGTH,
                tiles.len()
            )));
        }

        let guess = guess.map(str::to_ascii_lowercase);
        if let Some(ref word) = guess {
            for (letter, tile) in word.chars().zip(&tiles) {
                self.mark_key(letter, *tile);
            }
        }
        self.rows.push(BoardRow {
            guess: guess.clone(),
            tiles,
        });

        let shown = guess.as_deref().unwrap_or("?????").to_uppercase();
        self.status = match outcome.as_deref() {
            Some("win") => RoundStatus::Won,
            Some("lose") => RoundStatus::Lost,
            _ if self.remaining() == 0 => RoundStatus::Lost,
            _ => RoundStatus::Playing,
        };
        self.message = match self.status {
            RoundStatus::Won => format!("You won! The word was: {}", shown),
            RoundStatus::Lost => "Game Over!".to_string(),
            _ => {
                let remaining = self.remaining();
                format!(
                    "{} guess{} remaining",
                    remaining,
                    if remaining == 1 { "" } else { "es" }
                )
            }
        };

        Ok(GuessStep::Scored(self.status))
    }

    /// Correct beats everything; misplaced beats wrong.
    fn mark_key(&mut self, letter: char, tile: Tile) {
        let current = self.keyboard.get(&letter).copied();
        let next = match (tile, current) {
            (Tile::Correct, _) => Tile::Correct,
            (Tile::Misplaced, Some(Tile::Correct)) => Tile::Correct,
            (Tile::Misplaced, _) => Tile::Misplaced,
            (Tile::Wrong, Some(existing)) => existing,
            (Tile::Wrong, None) => Tile::Wrong,
        };
        self.keyboard.insert(letter, next);
    }
}

impl fmt::Display for SnuzzleBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let letters = row.guess.as_deref().unwrap_or("?????").to_uppercase();
            let squares: String = row.tiles.iter().map(|t| t.square()).collect();
            writeln!(f, "{}  {}", letters, squares)?;
        }
        for _ in 0..self.remaining() {
            writeln!(f, "_____")?;
        }
        Ok(())
    }
}

fn tile_feedback() -> &'static Regex {
    static FEEDBACK: OnceLock<Regex> = OnceLock::new();
    FEEDBACK.get_or_init(|| {
        Regex::new(r"feedback[:=]\s*([\x{1F7E5}-\x{1F7EB}\x{2B1B}\x{2B1C}]+)")
            .expect("valid feedback regex")
    })
}

fn decode_guess(result: &CommandResult) -> Result<Decoded, GameClientError> {
    if result.is_error_text() {
        return Ok(Decoded::NotInBank);
    }

    if let Some(object) = json_object(result) {
        let feedback = object
            .get("feedback")
            .and_then(|v| v.as_str())
            .ok_or_else(|| GameClientError::Decode("guess result has no tile feedback".into()))?;
        return Ok(Decoded::Scored {
            feedback: feedback.to_string(),
            result: object
                .get("result")
                .and_then(|v| v.as_str())
                .map(str::to_string),
        });
    }

    if let Some(caps) = result.as_text().and_then(|t| tile_feedback().captures(t)) {
        return Ok(Decoded::Scored {
            feedback: caps[1].to_string(),
            result: None,
        });
    }

    Err(GameClientError::Decode(format!(
        "unrecognized guess result: {}",
        result.raw()
    )))
}

/// Board reducer registered for [`Game::Snuzzle`](lexis_game_state::Game::Snuzzle).
pub struct SnuzzleHandler {
    board: Mutex<SnuzzleBoard>,
}

impl SnuzzleHandler {
    pub fn new(max_guesses: u32) -> Self {
        Self {
            board: Mutex::new(SnuzzleBoard::new(max_guesses)),
        }
    }

    /// Snapshot of the board.
    pub fn board(&self) -> SnuzzleBoard {
        self.board.lock().clone()
    }

    pub fn validate_guess(&self, input: &str) -> Result<String, String> {
        self.board.lock().validate_guess(input)
    }
}

impl GameHandler for SnuzzleHandler {
    fn handle(&self, command: &str, result: &CommandResult) {
        let mut board = self.board.lock();
        match verb(command) {
            "start" => board.reset(),
            "guess" => {
                if let Err(e) = board.apply_guess(command_arg(command, "guess"), result) {
                    tracing::warn!(command = %command, error = %e, "Could not read guess result");
                    board.message = "Failed to get response. Try again.".to_string();
                }
            }
            _ => {}
        }
    }

    fn round_status(&self) -> Option<RoundStatus> {
        Some(self.board.lock().status())
    }
}
