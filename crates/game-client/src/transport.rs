//! HTTP client for the interpreter service.
//!
//! Wraps the `/run`, `/run/{game}/batch`, `/fetch/session` and `/reset_game`
//! endpoints. Every endpoint is a JSON `POST`.

use async_trait::async_trait;
use lexis_game_state::Game;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::InterpreterConfig;
use crate::error::GameClientError;
use crate::traits::InterpreterTransport;
use crate::types::{
    BatchRequest, BatchResponse, CommandResult, GameRequest, RunRequest, SessionRecord,
};

/// Interpreter client over HTTP.
#[derive(Clone)]
pub struct HttpInterpreter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpInterpreter {
    pub fn new(config: &InterpreterConfig) -> Result<Self, GameClientError> {
        if config.base_url.trim().is_empty() {
            return Err(GameClientError::Config(
                "interpreter base_url cannot be empty".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GameClientError::Config(format!("HTTP client init: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<reqwest::Response, GameClientError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| GameClientError::transport(format!("POST {} failed: {}", path, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(GameClientError::Transport {
                reason: format!("POST {} rejected ({}): {}", path, status, body),
                status: Some(status.as_u16()),
            });
        }

        Ok(resp)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, GameClientError> {
        let resp = self.post(path, body).await?;
        resp.json()
            .await
            .map_err(|e| GameClientError::Decode(format!("POST {} parse: {}", path, e)))
    }
}

#[async_trait]
impl InterpreterTransport for HttpInterpreter {
    async fn run(&self, game: Game, command: &str) -> Result<CommandResult, GameClientError> {
        self.post_json(&format!("/run/{}", game), &RunRequest { command })
            .await
    }

    async fn run_batch(
        &self,
        game: Game,
        commands: &[String],
    ) -> Result<BatchResponse, GameClientError> {
        self.post_json(&format!("/run/{}/batch", game), &BatchRequest { commands })
            .await
    }

    async fn fetch_session(&self, game: Game) -> Result<SessionRecord, GameClientError> {
        self.post_json(
            &format!("/fetch/session/{}", game),
            &GameRequest {
                game: game.as_str(),
            },
        )
        .await
    }

    async fn reset_game(&self, game: Game) -> Result<(), GameClientError> {
        self.post(
            &format!("/reset_game/{}", game),
            &GameRequest {
                game: game.as_str(),
            },
        )
        .await
        .map(|_| ())
    }
}
