use anyhow::Result;
use lexis_game_client::{Game, GameRecord};

use super::{load_config, open_store, Overrides};

pub async fn run(overrides: &Overrides) -> Result<()> {
    let config = load_config(overrides)?;
    let store = open_store(&config)?;
    let snapshot = store.lock().snapshot();

    println!("📊 Lexis Arcade Status\n");
    println!("State dir : {}", config.state.dir.display());
    println!("Server    : {}\n", config.interpreter.base_url);

    for game in Game::ALL {
        let record = snapshot.get(&game).copied().unwrap_or_default();
        println!("{}", describe(game, &record));
    }
    println!();
    Ok(())
}

fn describe(game: Game, record: &GameRecord) -> String {
    let state = match (record.active, record.over) {
        (_, true) => "✓ Round over",
        (true, false) => "▶ In progress",
        (false, false) => "○ Not started",
    };
    format!(
        "{:<9} {:<14} streak {}",
        game.as_str(),
        state,
        record.winstreak
    )
}
