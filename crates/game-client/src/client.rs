//! Command client: sends commands to the interpreter, routes results to the
//! registered game handlers and keeps the persisted game state in step.

use std::sync::Arc;
use std::time::Instant;

use lexis_game_state::{
    DurableBackend, Game, GameStateStore, SessionPhase, StoreError, Transition,
};
use parking_lot::Mutex;

use crate::dispatch::HandlerRegistry;
use crate::error::GameClientError;
use crate::games::RoundStatus;
use crate::logging::{CommandAction, CommandLogger};
use crate::secret::SecretEvidence;
use crate::session::{plan_session, SessionStart};
use crate::traits::{GameHandler, InterpreterTransport};
use crate::types::{BatchEntry, BatchResult, CommandResult, Outcome};

/// Game-state store with the backend chosen at runtime.
pub type DynStore = GameStateStore<Box<dyn DurableBackend>>;

/// Shared handle to the game-state store.
pub type SharedStore = Arc<Mutex<DynStore>>;

pub struct CommandClient {
    transport: Arc<dyn InterpreterTransport>,
    handlers: HandlerRegistry,
    store: Option<SharedStore>,
    logger: Arc<CommandLogger>,
}

impl CommandClient {
    pub fn new(transport: Arc<dyn InterpreterTransport>) -> Self {
        Self {
            transport,
            handlers: HandlerRegistry::new(),
            store: None,
            logger: Arc::new(CommandLogger::default()),
        }
    }

    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_logger(mut self, logger: Arc<CommandLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn register_handler(&mut self, game: Game, handler: Arc<dyn GameHandler>) {
        self.handlers.register(game, handler);
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn store(&self) -> Option<&SharedStore> {
        self.store.as_ref()
    }

    pub fn logger(&self) -> &Arc<CommandLogger> {
        &self.logger
    }

    /// Execute one command.
    ///
    /// Guesses the interpreter replayed before answering are dispatched
    /// first (as `guess`), then the result of `command` itself.
    pub async fn send(&self, command: &str, game: Game) -> Result<CommandResult, GameClientError> {
        let start = Instant::now();
        let outcome = self.transport.run(game, command).await;
        self.log(game, CommandAction::Run, command, start, outcome.as_ref().err())
            .await;

        let result = outcome?;
        for replayed in result.replayed() {
            self.handlers.dispatch(game, "guess", &replayed);
        }
        self.handlers.dispatch(game, command, &result);
        Ok(result)
    }

    /// Execute `commands` in one round trip.
    ///
    /// The batch either succeeds as a whole or fails without dispatching
    /// anything: the interpreter must answer with one entry per command, in
    /// submission order.
    pub async fn send_batch(
        &self,
        commands: &[String],
        game: Game,
    ) -> Result<BatchResult, GameClientError> {
        let start = Instant::now();
        let outcome = self
            .transport
            .run_batch(game, commands)
            .await
            .and_then(|response| check_pairing(commands, response.results));
        self.log(
            game,
            CommandAction::Batch,
            &commands.join("; "),
            start,
            outcome.as_ref().err(),
        )
        .await;

        let batch = BatchResult::new(outcome?);
        for entry in &batch {
            self.handlers.dispatch(game, &entry.command, &entry.result);
        }
        Ok(batch)
    }

    /// Commands issued so far in the server-side session.
    pub async fn fetch_session(&self, game: Game) -> Result<Vec<String>, GameClientError> {
        let start = Instant::now();
        let outcome = self.transport.fetch_session(game).await;
        self.log(game, CommandAction::FetchSession, "", start, outcome.as_ref().err())
            .await;
        Ok(outcome?.commands)
    }

    /// Discard the server-side session and clear the local `active`/`over`
    /// flags. The local flags are cleared even when the interpreter cannot
    /// be reached; the transport error is still returned.
    pub async fn reset_session(&self, game: Game) -> Result<(), GameClientError> {
        let start = Instant::now();
        let outcome = self.transport.reset_game(game).await;
        self.log(game, CommandAction::Reset, "reset_game", start, outcome.as_ref().err())
            .await;

        self.update_store(|store| store.apply(game, Transition::Reset))?;
        outcome
    }

    /// Resume the round in progress or start a fresh one.
    ///
    /// Replays the server session through [`send_batch`](Self::send_batch)
    /// when it holds more than `setup.len()` commands, otherwise sends
    /// `setup`. A fresh round moves the persisted lifecycle to `Active`. A
    /// resumed round follows what the replay built: still playing means
    /// `Active`, and a replay that finished an active round records its
    /// outcome.
    pub async fn resume_or_start(
        &self,
        game: Game,
        setup: &[String],
    ) -> Result<SessionStart, GameClientError> {
        let previous = self.fetch_session(game).await?;
        let plan = plan_session(previous, setup);

        if plan.is_resume() {
            tracing::info!(game = %game, commands = plan.commands().len(), "Resuming session");
        } else {
            tracing::info!(game = %game, "Starting fresh session");
        }

        let batch = self.send_batch(plan.commands(), game).await?;

        let round = self.handlers.round_status(game);
        self.update_store(|store| {
            if plan.is_resume() {
                return reconcile_resumed(store, game, round);
            }
            if store.phase(game) == SessionPhase::Active {
                store.apply(game, Transition::Reset)?;
            }
            store.apply(game, Transition::Start)
        })?;

        Ok(SessionStart {
            resumed: plan.is_resume(),
            batch,
        })
    }

    /// Record a finished round: a win extends the streak, a loss clears it.
    /// Returns `None` when no store is attached.
    pub fn record_outcome(
        &self,
        game: Game,
        outcome: Outcome,
    ) -> Result<Option<SessionPhase>, GameClientError> {
        self.update_store(|store| store.apply(game, outcome_transition(outcome)))
    }

    /// Collect what the interpreter will tell us about the secret word:
    /// a fresh `show`, the word bank and the session commands.
    ///
    /// Only the `show` call is required. The word bank and session are
    /// supporting evidence, so their failures are logged and left empty.
    pub async fn gather_secret_evidence(
        &self,
        game: Game,
    ) -> Result<SecretEvidence, GameClientError> {
        let show = self.send("show", game).await?;

        let word_bank = match self.send("words", game).await {
            Ok(words) => Some(words),
            Err(e) => {
                tracing::warn!(game = %game, error = %e, "Word bank unavailable");
                None
            }
        };

        let session_commands = match self.fetch_session(game).await {
            Ok(commands) => commands,
            Err(e) => {
                tracing::warn!(game = %game, error = %e, "Session unavailable");
                Vec::new()
            }
        };

        Ok(SecretEvidence {
            show_results: vec![BatchEntry {
                command: "show".to_string(),
                result: show,
            }],
            word_bank,
            session_commands,
        })
    }

    fn update_store<T>(
        &self,
        f: impl FnOnce(&mut DynStore) -> Result<T, StoreError>,
    ) -> Result<Option<T>, GameClientError> {
        match &self.store {
            Some(store) => {
                let mut guard = store.lock();
                Ok(Some(f(&mut *guard)?))
            }
            None => Ok(None),
        }
    }

    async fn log(
        &self,
        game: Game,
        action: CommandAction,
        command: &str,
        start: Instant,
        error: Option<&GameClientError>,
    ) {
        if let Some(e) = error {
            tracing::error!(game = %game, command = %command, error = %e, "Interpreter call failed");
        }
        let entry = CommandLogger::entry(
            game,
            action,
            command,
            Some(start.elapsed().as_millis() as u64),
            error.map(|e| e.to_string()),
        );
        self.logger.log(&entry).await;
    }
}

fn outcome_transition(outcome: Outcome) -> Transition {
    match outcome {
        Outcome::Win => Transition::Win,
        Outcome::Lose => Transition::Lose,
    }
}

/// Bring the persisted phase in line with a replayed round.
///
/// A replay that is still playing means the round is active, whatever the
/// store remembers. A replay that ended an active round records its outcome.
fn reconcile_resumed(
    store: &mut DynStore,
    game: Game,
    round: Option<RoundStatus>,
) -> Result<SessionPhase, StoreError> {
    let mut phase = store.phase(game);
    let playing = round.is_some_and(|status| !status.is_over());

    if phase == SessionPhase::NotStarted || (phase == SessionPhase::Over && playing) {
        phase = store.apply(game, Transition::Start)?;
    }
    if phase == SessionPhase::Active {
        if let Some(outcome) = round.and_then(RoundStatus::outcome) {
            tracing::info!(game = %game, %outcome, "Replayed round already finished");
            phase = store.apply(game, outcome_transition(outcome))?;
        }
    }
    Ok(phase)
}

/// Check that `results` pairs 1:1, in order, with `commands`.
fn check_pairing(
    commands: &[String],
    results: Vec<BatchEntry>,
) -> Result<Vec<BatchEntry>, GameClientError> {
    if results.len() != commands.len() {
        return Err(GameClientError::Decode(format!(
            "batch returned {} results for {} commands",
            results.len(),
            commands.len()
        )));
    }

    for (i, (sent, entry)) in commands.iter().zip(&results).enumerate() {
        if *sent != entry.command {
            return Err(GameClientError::Decode(format!(
                "batch result {} is for '{}', expected '{}'",
                i, entry.command, sent
            )));
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BatchResponse, SessionRecord};
    use async_trait::async_trait;
    use lexis_game_state::MemoryBackend;
    use serde_json::json;

    /// Transport double answering from canned data and recording calls.
    #[derive(Default)]
    struct ScriptedTransport {
        session: Vec<String>,
        fail: bool,
        reordered: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl InterpreterTransport for ScriptedTransport {
        async fn run(&self, game: Game, command: &str) -> Result<CommandResult, GameClientError> {
            self.calls.lock().push(format!("run {} {}", game, command));
            if self.fail {
                return Err(GameClientError::transport("connection refused"));
            }
            Ok(CommandResult::new(json!(format!("ok {}", command))))
        }

        async fn run_batch(
            &self,
            game: Game,
            commands: &[String],
        ) -> Result<BatchResponse, GameClientError> {
            self.calls
                .lock()
                .push(format!("batch {} {}", game, commands.len()));
            if self.fail {
                return Err(GameClientError::Transport {
                    reason: "HTTP 500".to_string(),
                    status: Some(500),
                });
            }
            let mut results: Vec<BatchEntry> = commands
                .iter()
                .map(|c| BatchEntry {
                    command: c.clone(),
                    result: CommandResult::new(json!(format!("ok {}", c))),
                })
                .collect();
            if self.reordered {
                results.reverse();
            }
            Ok(BatchResponse {
                status: json!("ok"),
                results,
            })
        }

        async fn fetch_session(&self, game: Game) -> Result<SessionRecord, GameClientError> {
            self.calls.lock().push(format!("session {}", game));
            Ok(SessionRecord {
                commands: self.session.clone(),
            })
        }

        async fn reset_game(&self, game: Game) -> Result<(), GameClientError> {
            self.calls.lock().push(format!("reset {}", game));
            if self.fail {
                return Err(GameClientError::transport("connection refused"));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, CommandResult)>>);

    impl GameHandler for Recorder {
        fn handle(&self, command: &str, result: &CommandResult) {
            self.0.lock().push((command.to_string(), result.clone()));
        }
    }

    fn shared_store() -> SharedStore {
        let backend: Box<dyn DurableBackend> = Box::new(MemoryBackend::new());
        Arc::new(Mutex::new(GameStateStore::open(backend).unwrap()))
    }

    fn commands(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn batch_dispatches_in_order() {
        let recorder = Arc::new(Recorder::default());
        let mut client = CommandClient::new(Arc::new(ScriptedTransport::default()));
        client.register_handler(Game::Snuzzle, recorder.clone());

        let cmds = commands(&["file snuzzle", "start", "max_guesses 6", "word", "show"]);
        let batch = client.send_batch(&cmds, Game::Snuzzle).await.unwrap();

        assert_eq!(batch.len(), 5);
        let seen: Vec<String> = recorder.0.lock().iter().map(|(c, _)| c.clone()).collect();
        assert_eq!(seen, cmds);
        assert_eq!(client.logger().exchange_count().await, 1);
    }

    #[tokio::test]
    async fn failed_batch_dispatches_nothing() {
        let recorder = Arc::new(Recorder::default());
        let transport = ScriptedTransport {
            fail: true,
            ..Default::default()
        };
        let mut client = CommandClient::new(Arc::new(transport));
        client.register_handler(Game::Raildle, recorder.clone());

        let err = client
            .send_batch(&commands(&["start", "words"]), Game::Raildle)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(recorder.0.lock().is_empty());
    }

    #[tokio::test]
    async fn reordered_batch_is_a_decode_error() {
        let recorder = Arc::new(Recorder::default());
        let transport = ScriptedTransport {
            reordered: true,
            ..Default::default()
        };
        let mut client = CommandClient::new(Arc::new(transport));
        client.register_handler(Game::Snuzzle, recorder.clone());

        let err = client
            .send_batch(&commands(&["start", "show"]), Game::Snuzzle)
            .await
            .unwrap_err();
        assert!(matches!(err, GameClientError::Decode(_)));
        assert!(recorder.0.lock().is_empty());
    }

    #[test]
    fn pairing_accepts_repeated_commands() {
        let sent = commands(&["guess crane", "guess crane"]);
        let results = vec![
            BatchEntry {
                command: "guess crane".to_string(),
                result: CommandResult::new(json!(1)),
            },
            BatchEntry {
                command: "guess crane".to_string(),
                result: CommandResult::new(json!(2)),
            },
        ];
        let paired = check_pairing(&sent, results).unwrap();
        assert_eq!(paired[1].result.raw(), &json!(2));
    }

    #[tokio::test]
    async fn send_failure_propagates_without_dispatch() {
        let recorder = Arc::new(Recorder::default());
        let transport = ScriptedTransport {
            fail: true,
            ..Default::default()
        };
        let mut client = CommandClient::new(Arc::new(transport));
        client.register_handler(Game::Filmster, recorder.clone());

        assert!(client.send("guess Barbie", Game::Filmster).await.is_err());
        assert!(recorder.0.lock().is_empty());
    }

    #[tokio::test]
    async fn reset_clears_local_flags_even_when_server_fails() {
        let store = shared_store();
        store.lock().apply(Game::Snuzzle, Transition::Start).unwrap();
        store.lock().apply(Game::Snuzzle, Transition::Win).unwrap();

        let transport = ScriptedTransport {
            fail: true,
            ..Default::default()
        };
        let client = CommandClient::new(Arc::new(transport)).with_store(store.clone());

        assert!(client.reset_session(Game::Snuzzle).await.is_err());
        let guard = store.lock();
        assert!(!guard.is_active(Game::Snuzzle));
        assert!(!guard.is_over(Game::Snuzzle));
        assert_eq!(guard.get_winstreak(Game::Snuzzle), 1);
    }

    #[tokio::test]
    async fn fresh_start_sends_setup_and_activates() {
        let store = shared_store();
        let transport = Arc::new(ScriptedTransport::default());
        let client = CommandClient::new(transport.clone()).with_store(store.clone());

        let setup = commands(&["file snuzzle", "start", "max_guesses 6", "word", "show"]);
        let start = client.resume_or_start(Game::Snuzzle, &setup).await.unwrap();

        assert!(!start.resumed);
        assert_eq!(start.batch.len(), 5);
        assert!(store.lock().is_active(Game::Snuzzle));
        assert_eq!(
            *transport.calls.lock(),
            vec!["session snuzzle", "batch snuzzle 5"]
        );
    }

    #[tokio::test]
    async fn long_session_is_replayed() {
        let store = shared_store();
        let setup = commands(&["file snuzzle", "start", "max_guesses 6", "word", "show"]);
        let mut previous = setup.clone();
        previous.push("guess crane".to_string());
        previous.push("guess slate".to_string());

        let transport = Arc::new(ScriptedTransport {
            session: previous.clone(),
            ..Default::default()
        });
        let recorder = Arc::new(Recorder::default());
        let mut client = CommandClient::new(transport.clone()).with_store(store.clone());
        client.register_handler(Game::Snuzzle, recorder.clone());

        let start = client.resume_or_start(Game::Snuzzle, &setup).await.unwrap();
        assert!(start.resumed);
        assert_eq!(start.batch.len(), 7);
        assert_eq!(recorder.0.lock().last().unwrap().0, "guess slate");
        assert!(store.lock().is_active(Game::Snuzzle));
    }

    #[tokio::test]
    async fn fresh_start_over_active_state_restarts_round() {
        let store = shared_store();
        store.lock().apply(Game::Raildle, Transition::Start).unwrap();

        let client =
            CommandClient::new(Arc::new(ScriptedTransport::default())).with_store(store.clone());
        client
            .resume_or_start(Game::Raildle, &commands(&["file raildle", "start"]))
            .await
            .unwrap();

        assert_eq!(store.lock().phase(Game::Raildle), SessionPhase::Active);
    }

    /// Handler that reports a fixed round status after any replay.
    struct FixedRound(RoundStatus);

    impl GameHandler for FixedRound {
        fn handle(&self, _command: &str, _result: &CommandResult) {}

        fn round_status(&self) -> Option<RoundStatus> {
            Some(self.0)
        }
    }

    fn replaying_client(store: &SharedStore, game: Game, round: RoundStatus) -> CommandClient {
        let transport = Arc::new(ScriptedTransport {
            session: commands(&["file x", "start", "guess a"]),
            ..Default::default()
        });
        let mut client = CommandClient::new(transport).with_store(store.clone());
        client.register_handler(game, Arc::new(FixedRound(round)));
        client
    }

    #[tokio::test]
    async fn resumed_playable_round_reopens_finished_state() {
        let store = shared_store();
        store.lock().apply(Game::Filmster, Transition::Start).unwrap();
        store.lock().apply(Game::Filmster, Transition::Win).unwrap();

        let client = replaying_client(&store, Game::Filmster, RoundStatus::Playing);
        let start = client
            .resume_or_start(Game::Filmster, &commands(&["file x", "start"]))
            .await
            .unwrap();
        assert!(start.resumed);
        assert_eq!(store.lock().phase(Game::Filmster), SessionPhase::Active);

        client.record_outcome(Game::Filmster, Outcome::Lose).unwrap();
        assert_eq!(store.lock().get_winstreak(Game::Filmster), 0);
    }

    #[tokio::test]
    async fn resumed_finished_round_records_its_outcome_once() {
        let store = shared_store();
        store.lock().apply(Game::Raildle, Transition::Start).unwrap();

        let client = replaying_client(&store, Game::Raildle, RoundStatus::Won);
        let setup = commands(&["file x", "start"]);
        client.resume_or_start(Game::Raildle, &setup).await.unwrap();
        assert_eq!(store.lock().phase(Game::Raildle), SessionPhase::Over);
        assert_eq!(store.lock().get_winstreak(Game::Raildle), 1);

        client.resume_or_start(Game::Raildle, &setup).await.unwrap();
        assert_eq!(store.lock().phase(Game::Raildle), SessionPhase::Over);
        assert_eq!(store.lock().get_winstreak(Game::Raildle), 1);
    }

    #[tokio::test]
    async fn outcomes_drive_the_streak() {
        let store = shared_store();
        let client =
            CommandClient::new(Arc::new(ScriptedTransport::default())).with_store(store.clone());
        let setup = commands(&["file filmster", "start"]);

        client.resume_or_start(Game::Filmster, &setup).await.unwrap();
        client.record_outcome(Game::Filmster, Outcome::Win).unwrap();
        assert!(matches!(
            client.record_outcome(Game::Filmster, Outcome::Win),
            Err(GameClientError::Lifecycle(_))
        ));
        assert_eq!(store.lock().get_winstreak(Game::Filmster), 1);

        client.resume_or_start(Game::Filmster, &setup).await.unwrap();
        client.record_outcome(Game::Filmster, Outcome::Lose).unwrap();
        assert_eq!(store.lock().get_winstreak(Game::Filmster), 0);
    }

    #[tokio::test]
    async fn record_outcome_without_store_is_noop() {
        let client = CommandClient::new(Arc::new(ScriptedTransport::default()));
        assert_eq!(client.record_outcome(Game::Snuzzle, Outcome::Win).unwrap(), None);
    }

    #[tokio::test]
    async fn secret_evidence_collects_show_words_and_session() {
        let transport = Arc::new(ScriptedTransport {
            session: commands(&["word crane"]),
            ..Default::default()
        });
        let client = CommandClient::new(transport.clone());

        let evidence = client.gather_secret_evidence(Game::Snuzzle).await.unwrap();
        assert_eq!(evidence.show_results[0].result.as_text(), Some("ok show"));
        assert_eq!(
            evidence.word_bank.as_ref().and_then(|w| w.as_text()),
            Some("ok words")
        );
        assert_eq!(evidence.session_commands, vec!["word crane"]);
    }
}
