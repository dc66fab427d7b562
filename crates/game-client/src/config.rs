//! Configuration for the arcade client.
//!
//! Loaded from a TOML file or from environment variables on top of the
//! defaults, then validated before use.

use std::env;
use std::path::PathBuf;

use lexis_game_state::Game;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("IO error reading config file: {message}")]
    IoError { message: String },

    #[error("Configuration parsing error: {message}")]
    ParseError { message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArcadeConfig {
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub games: GameSettings,
}

/// Where the interpreter service lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Base URL, e.g. "http://127.0.0.1:5000".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout. Unset leaves the HTTP client's own default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Where persisted game state is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional JSONL file receiving one entry per command exchange.
    #[serde(default)]
    pub command_log: Option<PathBuf>,
}

/// Per-game guess limits sent as `max_guesses` during setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    #[serde(default = "default_snuzzle_max_guesses")]
    pub snuzzle_max_guesses: u32,
    #[serde(default = "default_filmster_max_guesses")]
    pub filmster_max_guesses: u32,
    #[serde(default = "default_raildle_max_guesses")]
    pub raildle_max_guesses: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexis-arcade")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_snuzzle_max_guesses() -> u32 {
    6
}

fn default_filmster_max_guesses() -> u32 {
    3
}

fn default_raildle_max_guesses() -> u32 {
    5
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            command_log: None,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            snuzzle_max_guesses: default_snuzzle_max_guesses(),
            filmster_max_guesses: default_filmster_max_guesses(),
            raildle_max_guesses: default_raildle_max_guesses(),
        }
    }
}

impl GameSettings {
    pub fn max_guesses(&self, game: Game) -> u32 {
        match game {
            Game::Snuzzle => self.snuzzle_max_guesses,
            Game::Filmster => self.filmster_max_guesses,
            Game::Raildle => self.raildle_max_guesses,
        }
    }
}

impl ArcadeConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay environment variables onto this configuration.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = env::var("LEXIS_SERVER_URL") {
            self.interpreter.base_url = url;
        }

        if let Ok(timeout) = env::var("LEXIS_TIMEOUT_SECS") {
            let secs = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                key: "LEXIS_TIMEOUT_SECS".to_string(),
                reason: "Invalid number of seconds".to_string(),
            })?;
            self.interpreter.timeout_secs = Some(secs);
        }

        if let Ok(dir) = env::var("LEXIS_STATE_DIR") {
            self.state.dir = PathBuf::from(dir);
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(path) = env::var("LEXIS_COMMAND_LOG") {
            self.logging.command_log = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Load configuration from a TOML file; missing sections take defaults.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            message: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.interpreter.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "interpreter.base_url".to_string(),
                reason: "Base URL cannot be empty".to_string(),
            });
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "interpreter.base_url".to_string(),
                reason: "Base URL must start with http:// or https://".to_string(),
            });
        }

        if self.interpreter.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "interpreter.timeout_secs".to_string(),
                reason: "Timeout must be > 0 when set".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                reason: format!("Must be one of: {}", valid_levels.join(", ")),
            });
        }

        for game in Game::ALL {
            if self.games.max_guesses(game) == 0 {
                return Err(ConfigError::InvalidValue {
                    key: format!("games.{}_max_guesses", game),
                    reason: "Must be > 0".to_string(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_are_valid() {
        let config = ArcadeConfig::default();
        assert_eq!(config.interpreter.base_url, "http://127.0.0.1:5000");
        assert!(config.interpreter.timeout_secs.is_none());
        assert_eq!(config.games.max_guesses(Game::Snuzzle), 6);
        assert_eq!(config.games.max_guesses(Game::Filmster), 3);
        assert_eq!(config.games.max_guesses(Game::Raildle), 5);
        assert!(config.state.dir.ends_with("lexis-arcade"));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn env_overrides_defaults() {
        env::set_var("LEXIS_SERVER_URL", "http://games.local:8000");
        env::set_var("LEXIS_TIMEOUT_SECS", "20");
        env::set_var("LOG_LEVEL", "debug");

        let config = ArcadeConfig::from_env().unwrap();
        assert_eq!(config.interpreter.base_url, "http://games.local:8000");
        assert_eq!(config.interpreter.timeout_secs, Some(20));
        assert_eq!(config.logging.level, "debug");

        env::remove_var("LEXIS_SERVER_URL");
        env::remove_var("LEXIS_TIMEOUT_SECS");
        env::remove_var("LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn invalid_timeout_env_is_rejected() {
        env::set_var("LEXIS_TIMEOUT_SECS", "soon");
        let result = ArcadeConfig::from_env();
        env::remove_var("LEXIS_TIMEOUT_SECS");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn partial_toml_file_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arcade.toml");
        std::fs::write(
            &path,
            "[interpreter]\nbase_url = \"https://lexis.example.com\"\n\n[games]\nsnuzzle_max_guesses = 8\n",
        )
        .unwrap();

        let config = ArcadeConfig::from_file(&path).unwrap();
        assert_eq!(config.interpreter.base_url, "https://lexis.example.com");
        assert_eq!(config.games.snuzzle_max_guesses, 8);
        assert_eq!(config.games.filmster_max_guesses, 3);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[interpreter\nbase_url = 3").unwrap();
        assert!(matches!(
            ArcadeConfig::from_file(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = ArcadeConfig::default();
        config.interpreter.base_url = "ftp://lexis".to_string();
        assert!(config.validate().is_err());

        let mut config = ArcadeConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = ArcadeConfig::default();
        config.games.raildle_max_guesses = 0;
        assert!(config.validate().is_err());

        let mut config = ArcadeConfig::default();
        config.interpreter.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }
}
