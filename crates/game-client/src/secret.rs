//! Secret-word recovery after a lost round.
//!
//! The interpreter has no dedicated "reveal" endpoint, so the secret has to
//! be recovered from whatever it does expose: `show` output, the word bank
//! and the session's commands. [`SecretResolver`] hides which of those a
//! given strategy trusts.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::types::{BatchEntry, CommandResult};

/// Shown when no strategy finds the secret.
pub const UNKNOWN_SECRET: &str = "UNKNOWN";

/// Structured fields that may carry the secret in a `show` result.
const SECRET_KEYS: &[&str] = &["word", "secret", "secret_word", "secretWord", "answer"];

/// Interpreter vocabulary that looks like a word but never is the secret.
const NOISE_WORDS: &[&str] = &[
    "loaded", "ready", "unknown", "state", "start", "guess", "error", "snuzzle", "file", "show",
    "game",
];

/// Everything the interpreter told us that might reveal the secret.
#[derive(Debug, Clone, Default)]
pub struct SecretEvidence {
    /// `show` exchanges, command included.
    pub show_results: Vec<BatchEntry>,
    /// Result of `words`, when it could be fetched.
    pub word_bank: Option<CommandResult>,
    /// Commands of the server-side session.
    pub session_commands: Vec<String>,
}

pub trait SecretResolver: Send + Sync {
    fn resolve(&self, evidence: &SecretEvidence) -> Option<String>;
}

/// Text shown to the player for a resolved (or unresolved) secret.
pub fn reveal(secret: Option<&str>) -> String {
    secret
        .map(str::to_uppercase)
        .unwrap_or_else(|| UNKNOWN_SECRET.to_string())
}

/// Trusts a structured field of the `show` result and nothing else.
#[derive(Debug, Clone)]
pub struct StructuredSecretResolver {
    keys: Vec<String>,
}

impl StructuredSecretResolver {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StructuredSecretResolver {
    /// The secret keys plus `name`, which filmster uses.
    fn default() -> Self {
        Self::new(SECRET_KEYS.iter().copied().chain(["name"]))
    }
}

impl SecretResolver for StructuredSecretResolver {
    fn resolve(&self, evidence: &SecretEvidence) -> Option<String> {
        evidence.show_results.iter().find_map(|entry| {
            self.keys.iter().find_map(|key| {
                entry
                    .result
                    .field_str(key)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        })
    }
}

/// Scrapes candidates out of free text and accepts the first one that is
/// in the word bank.
#[derive(Debug, Clone)]
pub struct ScrapingSecretResolver {
    word_length: usize,
}

impl ScrapingSecretResolver {
    pub fn new(word_length: usize) -> Self {
        Self { word_length }
    }

    /// Strip everything but letters and keep words of exactly the
    /// configured length, lowercased.
    fn normalize(&self, raw: &str) -> Option<String> {
        let cleaned: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect();
        (cleaned.len() == self.word_length).then(|| cleaned.to_lowercase())
    }

    fn push_candidate(&self, raw: &str, candidates: &mut Vec<String>) {
        if let Some(word) = self.normalize(raw) {
            if !NOISE_WORDS.contains(&word.as_str()) {
                candidates.push(word);
            }
        }
    }

    fn word_bank(&self, result: &CommandResult) -> HashSet<String> {
        match result.raw() {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.to_lowercase(),
                    other => other.to_string().to_lowercase(),
                })
                .collect(),
            serde_json::Value::Object(map) if !map.is_empty() => {
                map.keys().map(|k| k.to_lowercase()).collect()
            }
            serde_json::Value::String(text) => self.word_bank_from_text(text),
            serde_json::Value::Null => HashSet::new(),
            other => long_tokens(&other.to_string())
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    /// `"Words: crane, slate | brick"`: the list sits after the first colon.
    fn word_bank_from_text(&self, text: &str) -> HashSet<String> {
        let text = text.replace(['"', '\'', '\n'], " ");
        let text = text.trim();
        let list = match text.split_once(':') {
            Some((_, rest)) => rest.split(':').next().unwrap_or_default(),
            None => text,
        };

        list.split([',', '|'])
            .flat_map(str::split_whitespace)
            .filter_map(|w| self.normalize(w))
            .collect()
    }

    fn candidates(&self, evidence: &SecretEvidence) -> Vec<String> {
        let mut candidates = Vec::new();

        for entry in &evidence.show_results {
            let raw = entry.result.raw();
            if raw.is_object() {
                for key in SECRET_KEYS {
                    if let Some(value) = entry.result.field_str(key) {
                        self.push_candidate(value, &mut candidates);
                    }
                }
                for token in long_tokens(&raw.to_string()) {
                    self.push_candidate(token, &mut candidates);
                }
            }

            if let Some(text) = entry.result.as_text() {
                if let Some(caps) = announced_word().captures(text) {
                    self.push_candidate(&caps[1], &mut candidates);
                }
                for token in long_tokens(text) {
                    self.push_candidate(token, &mut candidates);
                }
            }

            if let Some(caps) = word_command().captures(&entry.command) {
                self.push_candidate(&caps[1], &mut candidates);
            }
        }

        for command in &evidence.session_commands {
            if let Some(caps) = word_command().captures(command) {
                self.push_candidate(&caps[1], &mut candidates);
            }
        }

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.clone()));
        candidates
    }
}

impl Default for ScrapingSecretResolver {
    fn default() -> Self {
        Self::new(5)
    }
}

impl SecretResolver for ScrapingSecretResolver {
    fn resolve(&self, evidence: &SecretEvidence) -> Option<String> {
        let bank = evidence
            .word_bank
            .as_ref()
            .map(|result| self.word_bank(result))
            .unwrap_or_default();

        let candidates = self.candidates(evidence);
        tracing::debug!(
            candidates = candidates.len(),
            bank = bank.len(),
            "Scraped secret candidates"
        );

        candidates.into_iter().find(|c| bank.contains(c))
    }
}

fn long_tokens(text: &str) -> impl Iterator<Item = &str> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN
        .get_or_init(|| Regex::new(r"\b([a-zA-Z]{5,})\b").expect("valid token regex"))
        .find_iter(text)
        .map(|m| m.as_str())
}

fn announced_word() -> &'static Regex {
    static ANNOUNCED: OnceLock<Regex> = OnceLock::new();
    ANNOUNCED.get_or_init(|| {
        Regex::new(r"(?i)(?:secret|answer|word)\s*(?:was|is|:)?\s*([a-zA-Z]{5,})")
            .expect("valid announcement regex")
    })
}

fn word_command() -> &'static Regex {
    static WORD_COMMAND: OnceLock<Regex> = OnceLock::new();
    WORD_COMMAND.get_or_init(|| {
        Regex::new(r"(?i)\bword[:\s]+\s*([a-zA-Z]{5,})\b").expect("valid word command regex")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn show(result: serde_json::Value) -> BatchEntry {
        BatchEntry {
            command: "show".to_string(),
            result: CommandResult::new(result),
        }
    }

    fn evidence(show_result: serde_json::Value, bank: serde_json::Value) -> SecretEvidence {
        SecretEvidence {
            show_results: vec![show(show_result)],
            word_bank: Some(CommandResult::new(bank)),
            session_commands: Vec::new(),
        }
    }

    #[test]
    fn structured_field_is_found_in_bank() {
        let ev = evidence(json!({"word": "CRANE"}), json!(["crane", "slate", "brick"]));
        assert_eq!(
            ScrapingSecretResolver::default().resolve(&ev).as_deref(),
            Some("crane")
        );
    }

    #[test]
    fn announced_text_is_scraped() {
        let ev = evidence(
            json!("Loaded state. The secret word is slate"),
            json!({"crane": 1, "slate": 1}),
        );
        // "state" is interpreter noise.
        assert_eq!(
            ScrapingSecretResolver::default().resolve(&ev).as_deref(),
            Some("slate")
        );
    }

    #[test]
    fn text_word_bank_is_parsed_after_colon() {
        let resolver = ScrapingSecretResolver::default();
        let bank = resolver.word_bank(&CommandResult::new(json!("Words: 'crane', slate | brick")));
        assert!(bank.contains("crane"));
        assert!(bank.contains("slate"));
        assert!(bank.contains("brick"));
        assert!(!bank.contains("words"));
    }

    #[test]
    fn session_word_command_is_used_as_fallback() {
        let ev = SecretEvidence {
            show_results: vec![show(json!("ready"))],
            word_bank: Some(CommandResult::new(json!(["brick", "crane"]))),
            session_commands: vec!["file snuzzle".into(), "word Brick".into()],
        };
        assert_eq!(
            ScrapingSecretResolver::default().resolve(&ev).as_deref(),
            Some("brick")
        );
    }

    #[test]
    fn candidate_outside_bank_is_rejected() {
        let ev = evidence(json!({"answer": "zzzzz"}), json!(["crane"]));
        assert_eq!(ScrapingSecretResolver::default().resolve(&ev), None);

        let no_bank = SecretEvidence {
            show_results: vec![show(json!({"word": "crane"}))],
            ..Default::default()
        };
        assert_eq!(ScrapingSecretResolver::default().resolve(&no_bank), None);
    }

    #[test]
    fn normalize_keeps_exact_length_letters_only() {
        let resolver = ScrapingSecretResolver::default();
        assert_eq!(resolver.normalize(" Cr-ane! ").as_deref(), Some("crane"));
        assert_eq!(resolver.normalize("cranes"), None);
        assert_eq!(resolver.normalize("abc"), None);
    }

    #[test]
    fn structured_resolver_reads_name_field() {
        let ev = evidence(json!({"name": "TheLionKing"}), json!(null));
        assert_eq!(
            StructuredSecretResolver::default().resolve(&ev).as_deref(),
            Some("TheLionKing")
        );
        assert_eq!(
            StructuredSecretResolver::new(["secret"]).resolve(&ev),
            None
        );
    }

    #[test]
    fn reveal_uppercases_or_reports_unknown() {
        assert_eq!(reveal(Some("crane")), "CRANE");
        assert_eq!(reveal(None), UNKNOWN_SECRET);
    }
}
