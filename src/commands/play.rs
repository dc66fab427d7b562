use anyhow::{bail, Result};
use lexis_game_client::games::filmster::{guess_command, ChoiceOutcome};
use lexis_game_client::{
    reveal, setup_commands, Game, GameClientError, Outcome, RoundStatus, ScrapingSecretResolver,
    SecretResolver, StructuredSecretResolver,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use super::{Arcade, Overrides};

type Input = Lines<BufReader<Stdin>>;

pub async fn run(overrides: &Overrides, game: Game, word: Option<String>) -> Result<()> {
    let arcade = Arcade::open(overrides)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let setup = setup_commands(
            game,
            arcade.config.games.max_guesses(game),
            word.as_deref(),
        );
        let start = arcade.client.resume_or_start(game, &setup).await?;
        if start.resumed {
            println!("▶ Game in progress, picking up where you left off.\n");
        }

        let status = arcade.handlers.status(game);
        if status == RoundStatus::Waiting {
            print_view(&arcade, game);
            bail!("{} could not be set up", game);
        }

        if !status.is_over() {
            print_help(game);
            print_view(&arcade, game);
            match play_round(&arcade, game, &mut input).await? {
                Some(outcome) => finish_round(&arcade, game, outcome).await?,
                None => return Ok(()),
            }
        } else {
            print_view(&arcade, game);
        }

        if !ask(&mut input, "Play again? [y/N] ").await? {
            return Ok(());
        }
        if let Err(e) = arcade.client.reset_session(game).await {
            println!("✗ Failed to reset game: {}", e);
            return Err(e.into());
        }
    }
}

fn print_help(game: Game) {
    match game {
        Game::Snuzzle => println!("Guess the five-letter word. Type `quit` to stop.\n"),
        Game::Filmster => {
            println!("Pick the movie by number or title. Type `quit` to stop.\n")
        }
        Game::Raildle => println!(
            "Type a character name to guess, `?<text>` to search. Type `quit` to stop.\n"
        ),
    }
}

fn print_view(arcade: &Arcade, game: Game) {
    let (view, message) = match game {
        Game::Snuzzle => {
            let board = arcade.handlers.snuzzle.board();
            (board.to_string(), board.message().to_string())
        }
        Game::Filmster => {
            let round = arcade.handlers.filmster.round();
            (round.to_string(), round.message().to_string())
        }
        Game::Raildle => {
            let round = arcade.handlers.raildle.round();
            (round.to_string(), round.message().to_string())
        }
    };
    println!("{}", view.trim_end());
    if !message.is_empty() {
        println!("\n{}", message);
    }
    println!();
}

/// Read guesses until the round ends. `None` when input runs out or the
/// player quits.
async fn play_round(arcade: &Arcade, game: Game, input: &mut Input) -> Result<Option<Outcome>> {
    loop {
        if let Some(outcome) = arcade.handlers.status(game).outcome() {
            return Ok(Some(outcome));
        }

        prompt("> ").await?;
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }

        match game {
            Game::Snuzzle => guess_snuzzle(arcade, line).await,
            Game::Filmster => guess_filmster(arcade, line).await,
            Game::Raildle => guess_raildle(arcade, line).await,
        }
    }
}

async fn guess_snuzzle(arcade: &Arcade, line: &str) {
    let guess = match arcade.handlers.snuzzle.validate_guess(line) {
        Ok(guess) => guess,
        Err(message) => {
            println!("{}\n", message);
            return;
        }
    };

    match arcade.client.send(&format!("guess {}", guess), Game::Snuzzle).await {
        Ok(_) => print_view(arcade, Game::Snuzzle),
        Err(e) => println!("✗ {}. Please try again.\n", e),
    }
}

async fn guess_filmster(arcade: &Arcade, line: &str) {
    let round = arcade.handlers.filmster.round();
    let pick = match line.parse::<usize>() {
        Ok(n) if n >= 1 && n <= round.choices().len() => round.choices()[n - 1].key.clone(),
        _ => line.to_string(),
    };

    let (key, outcome) = match arcade.handlers.filmster.choose(&pick) {
        Ok(choice) => choice,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };

    if outcome != ChoiceOutcome::Correct {
        // Wrong picks are reported so the server session can be replayed.
        if let Err(e) = arcade.client.send(&guess_command(&key), Game::Filmster).await {
            tracing::warn!(game = "filmster", error = %e, "Failed to record guess");
        }
    }
    print_view(arcade, Game::Filmster);
}

async fn guess_raildle(arcade: &Arcade, line: &str) {
    if let Some(term) = line.strip_prefix('?') {
        let round = arcade.handlers.raildle.round();
        let matches = round.filter(term);
        if matches.is_empty() {
            println!("  (no matches)\n");
        }
        for option in matches {
            println!("  • {}", option.label);
        }
        println!();
        return;
    }

    let command = match arcade.handlers.raildle.guess_command(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{}\n", e);
            return;
        }
    };

    match arcade.client.send(&command, Game::Raildle).await {
        Ok(_) => print_view(arcade, Game::Raildle),
        Err(e) => println!("✗ {}. Please try again.\n", e),
    }
}

async fn finish_round(arcade: &Arcade, game: Game, outcome: Outcome) -> Result<()> {
    match arcade.client.record_outcome(game, outcome) {
        Ok(_) => {}
        // Already recorded by an earlier run of the same server session.
        Err(GameClientError::Lifecycle(reason)) => {
            tracing::warn!(game = %game, %reason, "Outcome not recorded");
        }
        Err(e) => return Err(e.into()),
    }
    let streak = arcade.store.lock().get_winstreak(game);

    match outcome {
        Outcome::Win => println!("🎉 You won! Win streak: {}", streak),
        Outcome::Lose => {
            if let Some(resolver) = secret_resolver(game) {
                let secret = match arcade.client.gather_secret_evidence(game).await {
                    Ok(evidence) => resolver.resolve(&evidence),
                    Err(e) => {
                        tracing::warn!(game = %game, error = %e, "Could not fetch secret");
                        None
                    }
                };
                println!("Game Over! The word was: {}", reveal(secret.as_deref()));
            }
            println!("Win streak reset.");
        }
    }
    Ok(())
}

/// Filmster already names the answer when the round is lost.
fn secret_resolver(game: Game) -> Option<Box<dyn SecretResolver>> {
    match game {
        Game::Snuzzle => Some(Box::new(ScrapingSecretResolver::default())),
        Game::Raildle => Some(Box::new(StructuredSecretResolver::default())),
        Game::Filmster => None,
    }
}

async fn prompt(text: &str) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

async fn ask(input: &mut Input, question: &str) -> Result<bool> {
    prompt(question).await?;
    Ok(input
        .next_line()
        .await?
        .map(|answer| matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
        .unwrap_or(false))
}
