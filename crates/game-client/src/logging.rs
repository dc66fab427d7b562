//! Structured command-exchange logger.
//!
//! Writes one JSON entry per interpreter exchange through `tracing`, and
//! optionally appends it to a JSONL file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use lexis_game_state::Game;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Which client operation produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandAction {
    Run,
    Batch,
    FetchSession,
    Reset,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandLog {
    pub ts: DateTime<Utc>,
    pub game: Game,
    pub action: CommandAction,
    /// The command text; batches join their commands with `; `.
    pub command: String,
    pub success: bool,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

pub struct CommandLogger {
    log_path: Option<PathBuf>,
    count: RwLock<u64>,
}

impl CommandLogger {
    /// Create a logger appending to `log_path`; `None` logs to tracing only.
    pub fn new(log_path: Option<PathBuf>) -> Self {
        Self {
            log_path,
            count: RwLock::new(0),
        }
    }

    pub async fn log(&self, entry: &CommandLog) {
        let json = serde_json::to_string(entry).unwrap_or_else(|e| {
            format!(
                r#"{{"error":"serialization failed: {}","ts":"{}"}}"#,
                e,
                Utc::now().to_rfc3339()
            )
        });

        if entry.success {
            tracing::debug!(target: "lexis_command", "{}", json);
        } else {
            tracing::warn!(target: "lexis_command", "{}", json);
        }

        if let Some(ref path) = self.log_path {
            if let Err(e) = append_log_line(path, &json).await {
                tracing::warn!("Failed to write command log: {}", e);
            }
        }

        *self.count.write().await += 1;
    }

    pub fn entry(
        game: Game,
        action: CommandAction,
        command: &str,
        duration_ms: Option<u64>,
        error: Option<String>,
    ) -> CommandLog {
        CommandLog {
            ts: Utc::now(),
            game,
            action,
            command: command.to_string(),
            success: error.is_none(),
            duration_ms,
            error,
        }
    }

    pub async fn exchange_count(&self) -> u64 {
        *self.count.read().await
    }
}

impl Default for CommandLogger {
    fn default() -> Self {
        Self::new(None)
    }
}

async fn append_log_line(path: &std::path::Path, line: &str) -> Result<(), std::io::Error> {
    use tokio::io::AsyncWriteExt;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logger_counts_exchanges() {
        let logger = CommandLogger::new(None);
        assert_eq!(logger.exchange_count().await, 0);

        let entry = CommandLogger::entry(Game::Snuzzle, CommandAction::Run, "start", Some(3), None);
        logger.log(&entry).await;
        assert_eq!(logger.exchange_count().await, 1);
    }

    #[tokio::test]
    async fn logger_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.jsonl");
        let logger = CommandLogger::new(Some(path.clone()));

        logger
            .log(&CommandLogger::entry(
                Game::Raildle,
                CommandAction::Batch,
                "file raildle; start",
                Some(12),
                None,
            ))
            .await;
        logger
            .log(&CommandLogger::entry(
                Game::Raildle,
                CommandAction::Reset,
                "reset_game",
                None,
                Some("connection refused".to_string()),
            ))
            .await;

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"action\":\"batch\""));
        assert!(lines[1].contains("\"success\":false"));
    }

    #[test]
    fn entry_success_follows_error() {
        let ok = CommandLogger::entry(Game::Filmster, CommandAction::Run, "words", None, None);
        assert!(ok.success);

        let failed = CommandLogger::entry(
            Game::Filmster,
            CommandAction::FetchSession,
            "",
            None,
            Some("HTTP 500".to_string()),
        );
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("HTTP 500"));
    }
}
