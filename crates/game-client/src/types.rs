use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Terminal result reported by the interpreter for a guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win => write!(f, "win"),
            Outcome::Lose => write!(f, "lose"),
        }
    }
}

/// The interpreter's answer to one command.
///
/// The shape depends on the command, so the raw JSON is kept and typed
/// views are offered on top of it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandResult(serde_json::Value);

impl CommandResult {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_raw(self) -> serde_json::Value {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Object(map) => map.is_empty(),
            serde_json::Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Free-text status, when the interpreter answered with a bare string.
    pub fn as_text(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Interpreter-side errors come back as `"Error: ..."` text.
    pub fn is_error_text(&self) -> bool {
        self.as_text().is_some_and(|s| s.starts_with("Error:"))
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(|v| v.as_str())
    }

    /// `"win"` / `"lose"` from the `result` field, if present.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.field_str("result")? {
            "win" => Some(Outcome::Win),
            "lose" => Some(Outcome::Lose),
            _ => None,
        }
    }

    /// Guesses the interpreter replayed before answering the current command.
    pub fn replayed(&self) -> Vec<CommandResult> {
        self.field("replayed")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().cloned().map(CommandResult::new).collect())
            .unwrap_or_default()
    }
}

impl From<serde_json::Value> for CommandResult {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Per-category feedback cell (raildle answer table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCell {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub status: String,
}

impl FeedbackCell {
    pub fn is_correct(&self) -> bool {
        matches!(self.status.as_str(), "correct" | "green")
    }
}

/// Feedback attached to a guess result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Feedback {
    /// One emoji square per letter (snuzzle).
    Tiles(String),
    /// Category name → cell (raildle).
    Categories(BTreeMap<String, FeedbackCell>),
}

/// A decoded `guess` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessReport {
    pub feedback: Feedback,
    #[serde(default)]
    pub result: Option<String>,
}

impl GuessReport {
    pub fn outcome(&self) -> Option<Outcome> {
        match self.result.as_deref() {
            Some("win") => Some(Outcome::Win),
            Some("lose") => Some(Outcome::Lose),
            _ => None,
        }
    }
}

/// One (command, result) pair of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub command: String,
    #[serde(default)]
    pub result: CommandResult,
}

/// Ordered results of a batch, paired 1:1 with the submitted commands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchResult(Vec<BatchEntry>);

impl BatchResult {
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchEntry> {
        self.0.iter()
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.0
    }

    /// First entry whose command is exactly `command`.
    pub fn find(&self, command: &str) -> Option<&BatchEntry> {
        self.0.iter().find(|e| e.command == command)
    }

    /// First entry whose command starts with `prefix`.
    pub fn find_prefix(&self, prefix: &str) -> Option<&BatchEntry> {
        self.0.iter().find(|e| e.command.starts_with(prefix))
    }

    pub fn last(&self) -> Option<&BatchEntry> {
        self.0.last()
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a BatchEntry;
    type IntoIter = std::slice::Iter<'a, BatchEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Body of `POST /run/{game}`.
#[derive(Debug, Serialize)]
pub(crate) struct RunRequest<'a> {
    pub command: &'a str,
}

/// Body of `POST /run/{game}/batch`.
#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub commands: &'a [String],
}

/// Body of `POST /fetch/session/{game}` and `POST /reset_game/{game}`.
#[derive(Debug, Serialize)]
pub(crate) struct GameRequest<'a> {
    pub game: &'a str,
}

/// Response of `POST /run/{game}/batch`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub status: serde_json::Value,
    #[serde(default)]
    pub results: Vec<BatchEntry>,
}

/// Response of `POST /fetch/session/{game}`: commands issued so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub commands: Vec<String>,
}
