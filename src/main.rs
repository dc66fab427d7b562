use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use lexis_game_client::Game;

mod commands;

#[derive(Parser)]
#[command(name = "lexis-arcade")]
#[command(about = "Lexis Arcade - snuzzle, filmster and raildle in the terminal")]
#[command(version)]
struct Cli {
    /// Interpreter base URL (overrides config and LEXIS_SERVER_URL)
    #[arg(long, global = true, value_name = "URL")]
    server: Option<String>,

    /// Directory holding the persisted game state
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resume or start a round and play it interactively
    Play {
        /// snuzzle, filmster or raildle
        game: Game,
        /// Pin the secret word for a fresh round
        #[arg(long)]
        word: Option<String>,
    },
    /// Send one command and print its result
    Run {
        game: Game,
        /// Command text, e.g. `guess crane`
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Send commands as one batch
    Batch {
        game: Game,
        /// One argument per command, e.g. "file snuzzle" start
        #[arg(required = true)]
        commands: Vec<String>,
    },
    /// Print the server-side session commands
    Session { game: Game },
    /// Reset the server-side session and the local flags
    Reset { game: Game },
    /// Show persisted state for every game
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let overrides = commands::Overrides {
        server: cli.server,
        state_dir: cli.state_dir,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Play { game, word } => commands::play::run(&overrides, game, word).await,
        Commands::Run { game, command } => {
            commands::run::run(&overrides, game, &command.join(" ")).await
        }
        Commands::Batch {
            game,
            commands: batch,
        } => commands::batch::run(&overrides, game, &batch).await,
        Commands::Session { game } => commands::session::run(&overrides, game).await,
        Commands::Reset { game } => commands::reset::run(&overrides, game).await,
        Commands::Status => commands::status::run(&overrides).await,
    };

    if let Err(e) = result {
        eprintln!("✗ {:#}", e);
        process::exit(1);
    }
}
