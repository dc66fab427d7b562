//! Raildle: guess the character, scored per category.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use super::{command_arg, json_object, verb, RoundStatus};
use crate::error::GameClientError;
use crate::traits::GameHandler;
use crate::types::{CommandResult, Feedback, FeedbackCell, GuessReport, Outcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaildleOption {
    pub key: String,
    pub label: String,
    pub image: Option<String>,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRow {
    pub guess: Option<String>,
    pub cells: BTreeMap<String, FeedbackCell>,
}

impl AnswerRow {
    pub fn all_correct(&self) -> bool {
        !self.cells.is_empty() && self.cells.values().all(FeedbackCell::is_correct)
    }
}

/// Dropdown matcher: the term must start one of the words of `text`,
/// ignoring case. A blank term matches everything.
pub fn matches_start(term: &str, text: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    text.to_lowercase()
        .split_whitespace()
        .any(|word| word.starts_with(&term))
}

#[derive(Debug, Clone, Serialize)]
pub struct RaildleRound {
    max_guesses: u32,
    options: Vec<RaildleOption>,
    rows: Vec<AnswerRow>,
    tries: u32,
    status: RoundStatus,
    message: String,
}

impl RaildleRound {
    pub fn new(max_guesses: u32) -> Self {
        Self {
            max_guesses,
            options: Vec::new(),
            rows: Vec::new(),
            tries: 0,
            status: RoundStatus::Waiting,
            message: String::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_guesses);
        self.status = RoundStatus::Playing;
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    pub fn rows(&self) -> &[AnswerRow] {
        &self.rows
    }

    pub fn options(&self) -> &[RaildleOption] {
        &self.options
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Read the `words` result into dropdown options.
    ///
    /// Accepts `key → name`, `key → {name, img}` or a plain list of names.
    pub fn load_options(&mut self, result: &CommandResult) -> Result<(), GameClientError> {
        let options: Vec<RaildleOption> = match result.raw() {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(key, value)| {
                    let (label, image) = match value {
                        serde_json::Value::String(name) => (name.clone(), None),
                        serde_json::Value::Object(fields) => {
                            let text = |names: &[&str]| {
                                names
                                    .iter()
                                    .find_map(|n| fields.get(*n).and_then(|v| v.as_str()))
                                    .map(str::to_string)
                            };
                            (
                                text(&["name", "label"]).unwrap_or_else(|| key.clone()),
                                text(&["img", "image"]),
                            )
                        }
                        _ => (key.clone(), None),
                    };
                    RaildleOption {
                        key: key.clone(),
                        label,
                        image,
                        disabled: false,
                    }
                })
                .collect(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(|name| RaildleOption {
                    key: name.to_string(),
                    label: name.to_string(),
                    image: None,
                    disabled: false,
                })
                .collect(),
            other => {
                return Err(GameClientError::Decode(format!(
                    "unexpected raildle options: {}",
                    other
                )))
            }
        };

        self.options = options;
        for row in &self.rows {
            if let Some(ref key) = row.guess {
                disable(&mut self.options, key);
            }
        }
        Ok(())
    }

    /// Options still selectable whose label matches `term`.
    pub fn filter(&self, term: &str) -> Vec<&RaildleOption> {
        self.options
            .iter()
            .filter(|o| !o.disabled && matches_start(term, &o.label))
            .collect()
    }

    /// Turn the player's pick (key or label) into the `guess` command.
    pub fn guess_command(&self, pick: &str) -> Result<String, GameClientError> {
        if self.status != RoundStatus::Playing {
            return Err(GameClientError::Logic("The round is not in play.".to_string()));
        }
        let pick = pick.trim();
        let option = self
            .options
            .iter()
            .find(|o| o.key == pick || o.label.eq_ignore_ascii_case(pick))
            .ok_or_else(|| GameClientError::Logic(format!("No character named '{}'.", pick)))?;
        if option.disabled {
            return Err(GameClientError::Logic(format!(
                "{} was already guessed.",
                option.label
            )));
        }
        Ok(format!("guess {}", option.key))
    }

    /// Record the interpreter's answer to `guess`.
    pub fn apply_guess(
        &mut self,
        guess: Option<&str>,
        result: &CommandResult,
    ) -> Result<RoundStatus, GameClientError> {
        if result.is_error_text() {
            self.message = result.as_text().unwrap_or_default().to_string();
            return Ok(self.status);
        }

        let object = json_object(result).ok_or_else(|| {
            GameClientError::Decode(format!("unrecognized guess result: {}", result.raw()))
        })?;
        let report: GuessReport = serde_json::from_value(object)
            .map_err(|e| GameClientError::Decode(format!("guess result: {}", e)))?;
        let outcome = report.outcome();
        let cells = match report.feedback {
            Feedback::Categories(cells) => cells,
            Feedback::Tiles(_) => {
                return Err(GameClientError::Decode(
                    "expected category feedback, got tiles".to_string(),
                ))
            }
        };

        if let Some(key) = guess {
            disable(&mut self.options, key);
        }
        self.rows.push(AnswerRow {
            guess: guess.map(str::to_string),
            cells,
        });
        self.tries += 1;

        self.status = match outcome {
            Some(Outcome::Win) => RoundStatus::Won,
            Some(Outcome::Lose) => RoundStatus::Lost,
            None if self.tries >= self.max_guesses => RoundStatus::Lost,
            None => RoundStatus::Playing,
        };
        self.message = match self.status {
            RoundStatus::Won => "You got it!".to_string(),
            RoundStatus::Lost => "Out of guesses!".to_string(),
            _ => format!("{} of {} guesses used", self.tries, self.max_guesses),
        };
        Ok(self.status)
    }
}

fn disable(options: &mut [RaildleOption], key: &str) {
    if let Some(option) = options.iter_mut().find(|o| o.key == key) {
        option.disabled = true;
    }
}

impl fmt::Display for RaildleRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            let label = row.guess.as_deref().unwrap_or("?");
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|(category, cell)| {
                    let value = cell
                        .value
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| cell.value.to_string());
                    let mark = if cell.is_correct() { '🟩' } else { '🟥' };
                    format!("{} {}={}", mark, category, value)
                })
                .collect();
            writeln!(f, "{}: {}", label, cells.join("  "))?;
        }
        write!(f, "Tries: {}/{}", self.tries, self.max_guesses)
    }
}

/// Round reducer registered for [`Game::Raildle`](lexis_game_state::Game::Raildle).
pub struct RaildleHandler {
    round: Mutex<RaildleRound>,
}

impl RaildleHandler {
    pub fn new(max_guesses: u32) -> Self {
        Self {
            round: Mutex::new(RaildleRound::new(max_guesses)),
        }
    }

    pub fn round(&self) -> RaildleRound {
        self.round.lock().clone()
    }

    pub fn guess_command(&self, pick: &str) -> Result<String, GameClientError> {
        self.round.lock().guess_command(pick)
    }
}

impl GameHandler for RaildleHandler {
    fn handle(&self, command: &str, result: &CommandResult) {
        let mut round = self.round.lock();
        match verb(command) {
            "start" => round.reset(),
            "words" => {
                if let Err(e) = round.load_options(result) {
                    tracing::warn!(error = %e, "Could not read raildle options");
                }
            }
            "guess" => {
                if let Err(e) = round.apply_guess(command_arg(command, "guess"), result) {
                    tracing::warn!(command = %command, error = %e, "Could not read guess result");
                    round.message = "Failed to get response. Try again.".to_string();
                }
            }
            _ => {}
        }
    }

    fn round_status(&self) -> Option<RoundStatus> {
        Some(self.round.lock().status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> CommandResult {
        CommandResult::new(json!({
            "RemembranceTrailblazer": {"name": "Remembrance Trailblazer", "img": "trailblazer.png"},
            "March7th": "March 7th",
            "DanHeng": "Dan Heng",
        }))
    }

    fn feedback(correct: bool, result: Option<&str>) -> CommandResult {
        let status = if correct { "correct" } else { "wrong" };
        CommandResult::new(json!({
            "feedback": {
                "path": {"value": "Remembrance", "status": status},
                "element": {"value": "Ice", "status": status}
            },
            "result": result
        }))
    }

    fn playing(max: u32) -> RaildleRound {
        let mut round = RaildleRound::new(max);
        round.reset();
        round.load_options(&options()).unwrap();
        round
    }

    #[test]
    fn start_of_word_matching() {
        assert!(matches_start("", "Dan Heng"));
        assert!(matches_start("he", "Dan Heng"));
        assert!(matches_start("MAR", "March 7th"));
        assert!(!matches_start("eng", "Dan Heng"));
    }

    #[test]
    fn options_accept_names_objects_and_lists() {
        let round = playing(5);
        let trail = round
            .options()
            .iter()
            .find(|o| o.key == "RemembranceTrailblazer")
            .unwrap();
        assert_eq!(trail.label, "Remembrance Trailblazer");
        assert_eq!(trail.image.as_deref(), Some("trailblazer.png"));

        let mut listed = RaildleRound::new(5);
        listed
            .load_options(&CommandResult::new(json!(["Himeko", "Welt"])))
            .unwrap();
        assert_eq!(listed.options().len(), 2);

        assert!(listed.load_options(&CommandResult::new(json!("nope"))).is_err());
    }

    #[test]
    fn guessed_option_is_disabled_and_filtered_out() {
        let mut round = playing(5);
        let command = round.guess_command("dan heng").unwrap();
        assert_eq!(command, "guess DanHeng");

        round
            .apply_guess(command_arg(&command, "guess"), &feedback(false, None))
            .unwrap();
        assert_eq!(round.tries(), 1);
        assert!(round.filter("dan").is_empty());
        assert_eq!(round.filter("").len(), 2);
        assert!(round.guess_command("DanHeng").is_err());
        assert_eq!(round.message(), "1 of 5 guesses used");
    }

    #[test]
    fn feedback_becomes_answer_row() {
        let mut round = playing(5);
        let status = round
            .apply_guess(Some("March7th"), &feedback(true, Some("win")))
            .unwrap();
        assert_eq!(status, RoundStatus::Won);
        assert!(round.rows()[0].all_correct());
        assert!(round.guess_command("Dan Heng").is_err());
    }

    #[test]
    fn running_out_of_guesses_loses() {
        let mut round = playing(2);
        round.apply_guess(Some("March7th"), &feedback(false, None)).unwrap();
        let status = round.apply_guess(Some("DanHeng"), &feedback(false, None)).unwrap();
        assert_eq!(status, RoundStatus::Lost);
    }

    #[test]
    fn tile_feedback_is_rejected() {
        let mut round = playing(5);
        let err = round
            .apply_guess(Some("DanHeng"), &CommandResult::new(json!({"feedback": "🟩🟩🟩🟩🟩"})))
            .unwrap_err();
        assert!(matches!(err, GameClientError::Decode(_)));
        assert_eq!(round.tries(), 0);
    }

    #[test]
    fn handler_rebuilds_from_replayed_session() {
        let handler = RaildleHandler::new(5);
        handler.handle("file raildle", &CommandResult::default());
        handler.handle("start", &CommandResult::default());
        handler.handle("guess DanHeng", &feedback(false, None));
        handler.handle("words", &options());
        handler.handle("guess", &feedback(false, None));

        let round = handler.round();
        assert_eq!(round.tries(), 2);
        assert!(round.options().iter().any(|o| o.key == "DanHeng" && o.disabled));
        assert_eq!(round.status(), RoundStatus::Playing);
    }

    #[test]
    fn display_lists_rows_and_tries() {
        let mut round = playing(5);
        round.apply_guess(Some("March7th"), &feedback(false, None)).unwrap();
        let text = round.to_string();
        assert!(text.contains("March7th: 🟥 element=Ice  🟥 path=Remembrance"));
        assert!(text.ends_with("Tries: 1/5"));
    }
}
