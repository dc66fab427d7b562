pub mod batch;
pub mod play;
pub mod reset;
pub mod run;
pub mod session;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use lexis_game_client::{
    ArcadeConfig, CommandClient, CommandLogger, DurableBackend, FileBackend, GameHandlers,
    GameStateStore, HttpInterpreter, SharedStore,
};
use parking_lot::Mutex;
use tracing_subscriber::filter::Directive;

/// Global command-line flags that override the loaded configuration.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub server: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Config file (when given), then environment, then command-line flags.
pub fn load_config(overrides: &Overrides) -> Result<ArcadeConfig> {
    let mut config = match overrides.config {
        Some(ref path) => ArcadeConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ArcadeConfig::default(),
    };
    config.apply_env()?;

    if let Some(ref server) = overrides.server {
        config.interpreter.base_url = server.clone();
    }
    if let Some(ref dir) = overrides.state_dir {
        config.state.dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(level: &str) {
    let directive: Directive = level
        .parse()
        .unwrap_or_else(|_| tracing::Level::INFO.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Everything a subcommand needs: config, the wired client, its handlers
/// and the persisted store.
pub struct Arcade {
    pub config: ArcadeConfig,
    pub client: CommandClient,
    pub handlers: GameHandlers,
    pub store: SharedStore,
}

impl Arcade {
    pub fn open(overrides: &Overrides) -> Result<Self> {
        let config = load_config(overrides)?;
        init_tracing(&config.logging.level);

        let store = open_store(&config)?;
        let transport = HttpInterpreter::new(&config.interpreter)?;
        let logger = CommandLogger::new(config.logging.command_log.clone());

        let mut client = CommandClient::new(Arc::new(transport))
            .with_store(store.clone())
            .with_logger(Arc::new(logger));
        let handlers = GameHandlers::new(&config.games);
        handlers.register(&mut client);

        tracing::debug!(
            server = %config.interpreter.base_url,
            state_dir = %config.state.dir.display(),
            "Arcade ready"
        );

        Ok(Self {
            config,
            client,
            handlers,
            store,
        })
    }
}

pub fn open_store(config: &ArcadeConfig) -> Result<SharedStore> {
    let backend = FileBackend::new(&config.state.dir)
        .with_context(|| format!("opening state dir {}", config.state.dir.display()))?;
    let backend: Box<dyn DurableBackend> = Box::new(backend);
    let store = GameStateStore::open(backend)?;
    Ok(Arc::new(Mutex::new(store)))
}

/// Render a result for the terminal: bare strings as-is, JSON pretty.
pub fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arcade.toml");
        std::fs::write(
            &path,
            "[interpreter]\nbase_url = \"http://file:5000\"\n[games]\nsnuzzle_max_guesses = 4\n",
        )
        .unwrap();

        let overrides = Overrides {
            server: Some("http://flag:7000".to_string()),
            state_dir: Some(dir.path().join("state")),
            config: Some(path),
        };
        let config = load_config(&overrides).unwrap();
        assert_eq!(config.interpreter.base_url, "http://flag:7000");
        assert_eq!(config.games.snuzzle_max_guesses, 4);
        assert_eq!(config.state.dir, dir.path().join("state"));
    }

    #[test]
    fn invalid_server_flag_is_rejected() {
        let overrides = Overrides {
            server: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(load_config(&overrides).is_err());
    }

    #[test]
    fn render_strings_plain() {
        assert_eq!(render(&json!("Loaded snuzzle")), "Loaded snuzzle");
        assert!(render(&json!({"a": 1})).contains("\"a\": 1"));
    }
}
